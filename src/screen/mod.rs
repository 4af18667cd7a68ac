//! Styled cell grid and the diff renderer that draws it.

pub mod buffer;
pub mod cell;
pub mod renderer;

pub use buffer::{Buffer, Pos};
pub use cell::{Attrs, Style};
pub use renderer::Renderer;
