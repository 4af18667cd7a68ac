use crate::colors::Rgba;
use crossterm::style::Attribute;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Kind {
    /// Never written; composing a clear cell is a no-op
    Clear,
    /// Terminal default colors
    #[default]
    Default,
    /// 24-bit colors from `fg`/`bg`
    TrueColor,
}

/// Set of SGR attributes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Attrs(u8);

impl Attrs {
    pub const NONE: Attrs = Attrs(0);
    pub const BOLD: Attrs = Attrs(1);
    pub const REVERSE: Attrs = Attrs(1 << 1);
    pub const UNDERLINE: Attrs = Attrs(1 << 2);

    pub fn contains(self, other: Attrs) -> bool {
        self.0 & other.0 == other.0
    }

    /// crossterm attributes to emit for this set
    pub fn sgr(self) -> impl Iterator<Item = Attribute> {
        [
            (Attrs::BOLD, Attribute::Bold),
            (Attrs::REVERSE, Attribute::Reverse),
            (Attrs::UNDERLINE, Attribute::Underlined),
        ]
        .into_iter()
        .filter(move |(flag, _)| self.contains(*flag))
        .map(|(_, attr)| attr)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Style {
    pub kind: Kind,
    pub attrs: Attrs,
    pub fg: Rgba,
    pub bg: Rgba,
}

impl Style {
    const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);

    /// Terminal default colors
    pub const fn plain(attrs: Attrs) -> Self {
        Self { kind: Kind::Default, attrs, fg: Self::TRANSPARENT, bg: Self::TRANSPARENT }
    }

    pub const fn color(fg: Rgba, bg: Rgba) -> Self {
        Self { kind: Kind::TrueColor, attrs: Attrs::NONE, fg, bg }
    }
}

impl Default for Style {
    fn default() -> Self {
        Self::plain(Attrs::NONE)
    }
}

/// One terminal cell. An empty glyph marks the right half of a wide glyph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    pub z: i32,
    pub style: Style,
    pub glyph: String,
}

impl Cell {
    pub fn new(z: i32, style: Style, glyph: &str) -> Self {
        Self { z, style, glyph: glyph.to_string() }
    }

    pub fn blank(style: Style) -> Self {
        Self::new(0, style, " ")
    }

    pub fn is_continuation(&self) -> bool {
        self.glyph.is_empty()
    }

    /// Same on screen, ignoring depth.
    pub fn looks_like(&self, other: &Cell) -> bool {
        self.style == other.style && self.glyph == other.glyph
    }
}
