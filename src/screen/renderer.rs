use super::buffer::Buffer;
use super::cell::{Attrs, Cell, Kind, Style};
use crate::colors::Rgba;
use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::{Attribute, Color, Print, SetAttribute, SetBackgroundColor, SetForegroundColor};
use crossterm::terminal::{Clear, ClearType};
use std::io::{self, Write};
use unicode_width::UnicodeWidthStr;

/// What the terminal currently has set. `None` colors are the terminal default.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct TermStyle {
    attrs: Attrs,
    fg: Option<Rgba>,
    bg: Option<Rgba>,
}

impl TermStyle {
    const RESET: TermStyle = TermStyle { attrs: Attrs::NONE, fg: None, bg: None };

    fn of(style: &Style) -> Self {
        let opaque = |c: Rgba| Rgba { a: 255, ..c };
        match style.kind {
            Kind::TrueColor => TermStyle {
                attrs: style.attrs,
                fg: Some(opaque(style.fg)),
                bg: Some(opaque(style.bg)),
            },
            Kind::Default | Kind::Clear => TermStyle { attrs: style.attrs, fg: None, bg: None },
        }
    }
}

fn glyph_width(glyph: &str) -> usize {
    UnicodeWidthStr::width(glyph)
}

/// Double-buffered diff renderer.
///
/// Draw into [`Renderer::buffer`], then call [`Renderer::render`]. Only cells
/// that differ from the previous frame are emitted, and only the SGR state
/// that differs from what was last sent.
pub struct Renderer {
    blank: Cell,
    current: Buffer,
    previous: Buffer,
    fresh: bool,
    term: TermStyle,
    out: Vec<u8>,
}

impl Renderer {
    pub fn new(cols: usize, rows: usize, base: Style) -> Self {
        let blank = Cell::blank(base);
        Self {
            current: Buffer::new(cols, rows, &blank),
            previous: Buffer::new(cols, rows, &blank),
            blank,
            fresh: true,
            term: TermStyle::RESET,
            out: Vec::new(),
        }
    }

    pub fn size(&self) -> (usize, usize) {
        (self.current.cols(), self.current.rows())
    }

    pub fn buffer(&mut self) -> &mut Buffer {
        &mut self.current
    }

    #[cfg(test)]
    pub fn is_fresh(&self) -> bool {
        self.fresh
    }

    pub fn resize(&mut self, cols: usize, rows: usize) {
        self.current = Buffer::new(cols, rows, &self.blank);
        self.previous = Buffer::new(cols, rows, &self.blank);
        self.fresh = true;
    }

    /// Change the blank-cell style. Takes effect with a full clear.
    pub fn set_base(&mut self, base: Style) {
        if base == self.blank.style {
            return;
        }
        self.blank = Cell::blank(base);
        self.current.fill(&self.blank);
        self.redraw();
    }

    /// Clear and repaint everything on the next render.
    pub fn redraw(&mut self) {
        self.fresh = true;
    }

    fn set_style(&mut self, style: &Style) -> io::Result<()> {
        let want = TermStyle::of(style);
        if want.attrs != self.term.attrs {
            queue!(self.out, SetAttribute(Attribute::Reset))?;
            for attr in want.attrs.sgr() {
                queue!(self.out, SetAttribute(attr))?;
            }
            self.term = TermStyle { attrs: want.attrs, ..TermStyle::RESET };
        }
        if want.fg != self.term.fg {
            queue!(self.out, SetForegroundColor(want.fg.map_or(Color::Reset, Rgba::to_color)))?;
            self.term.fg = want.fg;
        }
        if want.bg != self.term.bg {
            queue!(self.out, SetBackgroundColor(want.bg.map_or(Color::Reset, Rgba::to_color)))?;
            self.term.bg = want.bg;
        }
        Ok(())
    }

    /// Build the escape sequence for this frame and advance to the next one.
    /// The returned bytes are empty when nothing changed.
    pub fn render(&mut self) -> io::Result<&[u8]> {
        self.out.clear();

        if self.fresh {
            self.previous.fill(&self.blank);
            let rows = self.current.rows().max(1) as u16;
            queue!(self.out, MoveTo(0, rows - 1), SetAttribute(Attribute::Reset))?;
            self.term = TermStyle::RESET;
            let base = self.blank.style;
            self.set_style(&base)?;
            queue!(self.out, Clear(ClearType::All))?;
        }

        let cols = self.current.cols();
        let mut cursor = None;
        for row in 0..self.current.rows() {
            // Set after a wide glyph changes, so its old right half is repainted.
            let mut repaint = false;
            for col in 0..cols {
                let cell = self.current.at(col, row);
                let changed = repaint || !cell.looks_like(self.previous.at(col, row));
                repaint = changed && glyph_width(&self.previous.at(col, row).glyph) == 2;
                if !changed {
                    continue;
                }
                // A continuation without a wide glyph to its left shows as a space.
                let orphan = cell.is_continuation();
                if orphan && col > 0 && glyph_width(&self.current.at(col - 1, row).glyph) == 2 {
                    continue;
                }

                let style = cell.style;
                if cursor != Some((col, row)) {
                    queue!(self.out, MoveTo(col as u16, row as u16))?;
                }
                self.set_style(&style)?;
                let cell = self.current.at(col, row);
                let glyph = if orphan { " " } else { cell.glyph.as_str() };
                let next = col + glyph_width(glyph).max(1);
                queue!(self.out, Print(glyph))?;
                cursor = (next < cols).then_some((next, row));
            }
        }

        self.finish_frame();
        Ok(&self.out)
    }

    /// Write the frame as plain glyph rows, without escape codes.
    pub fn render_raw(&mut self, out: &mut impl Write) -> io::Result<()> {
        for line in self.current.lines() {
            writeln!(out, "{}", line)?;
        }
        self.fresh = false;
        self.finish_frame();
        Ok(())
    }

    fn finish_frame(&mut self) {
        std::mem::swap(&mut self.current, &mut self.previous);
        self.current.fill(&self.blank);
        self.fresh = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screen::buffer::Pos;

    const FG: Rgba = Rgba::opaque(0x4f, 0xea, 0xe7);
    const BG: Rgba = Rgba::opaque(0x1b, 0x1e, 0x24);

    fn renderer() -> Renderer {
        Renderer::new(8, 4, Style::color(Rgba::opaque(255, 255, 255), BG))
    }

    fn draw(r: &mut Renderer) {
        let buf = r.buffer();
        buf.compose(Pos::new(0, 0), 1, Style::color(FG, BG), "█");
        buf.compose(Pos::new(1, 0), 1, Style::color(FG, BG), "▄");
        buf.move_to(Pos::new(2, 3));
        buf.put("hi", Style::plain(Attrs::BOLD), 1);
    }

    fn text(bytes: &[u8]) -> String {
        String::from_utf8_lossy(bytes).into_owned()
    }

    #[test]
    fn first_frame_clears_with_base_style() {
        let mut r = renderer();
        draw(&mut r);
        let out = text(r.render().unwrap());
        assert!(out.contains("\x1b[2J"));
        assert!(out.contains("\x1b[48;2;27;30;36m"));
        assert!(out.contains("█▄"));
        // Adjacent cells share one cursor move.
        assert!(out.contains("\x1b[1;3H\x1b[0m\x1b[1mhi"));
        assert!(!out.contains("\x1b[1;4H"));
    }

    #[test]
    fn identical_frame_emits_nothing() {
        let mut r = renderer();
        draw(&mut r);
        r.render().unwrap();
        draw(&mut r);
        assert!(r.render().unwrap().is_empty());
    }

    #[test]
    fn blank_frame_after_content_erases_it() {
        let mut r = renderer();
        draw(&mut r);
        r.render().unwrap();
        let out = text(r.render().unwrap());
        // Bottom row is terminal row 4.
        assert!(out.contains("\x1b[4;1H"));
        assert!(!out.contains("\x1b[2J"));
    }

    #[test]
    fn shared_colors_are_sent_once() {
        let mut r = renderer();
        r.render().unwrap();
        draw(&mut r);
        let out = text(r.render().unwrap());
        assert_eq!(out.matches("\x1b[38;2;79;234;231m").count(), 1);
        // Attribute changes go through a full SGR reset.
        assert!(out.contains("\x1b[0m\x1b[1m"));
    }

    #[test]
    fn continuation_cells_are_not_printed() {
        let mut r = renderer();
        r.render().unwrap();
        r.buffer().move_to(Pos::new(0, 0));
        r.buffer().put("日", Style::color(FG, BG), 1);
        let out = text(r.render().unwrap());
        assert_eq!(out.matches("\x1b[4;").count(), 1);
        assert_eq!(out.matches('日').count(), 1);
    }

    #[test]
    fn cursor_skips_past_wide_glyphs() {
        let mut r = renderer();
        r.render().unwrap();
        r.buffer().move_to(Pos::new(0, 0));
        r.buffer().put("日x", Style::color(FG, BG), 1);
        let out = text(r.render().unwrap());
        assert!(out.contains("日x"));
        assert!(!out.contains("\x1b[4;3H"));
    }

    #[test]
    fn narrow_glyph_over_wide_one_clears_its_right_half() {
        let mut r = renderer();
        r.render().unwrap();
        r.buffer().move_to(Pos::new(0, 0));
        r.buffer().put("日", Style::color(FG, BG), 1);
        r.render().unwrap();

        r.buffer().move_to(Pos::new(0, 0));
        r.buffer().put("日", Style::color(FG, BG), 1);
        r.buffer().compose(Pos::new(0, 0), 1, Style::color(FG, BG), "a");
        let out = text(r.render().unwrap());
        assert!(out.contains("\x1b[4;1Ha "), "{:?}", out);
        assert!(!out.contains('日'));
    }

    #[test]
    fn resize_and_base_change_force_a_clear() {
        let mut r = renderer();
        r.render().unwrap();
        r.resize(10, 5);
        assert!(text(r.render().unwrap()).contains("\x1b[2J"));

        r.set_base(Style::plain(Attrs::NONE));
        assert!(r.is_fresh());
        assert!(text(r.render().unwrap()).contains("\x1b[2J"));
    }

    #[test]
    fn raw_output_is_plain_text() {
        let mut r = renderer();
        draw(&mut r);
        let mut out = Vec::new();
        r.render_raw(&mut out).unwrap();
        let s = text(&out);
        let lines: Vec<&str> = s.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "  hi    ");
        assert_eq!(lines[3], "█▄      ");
        assert!(!s.contains('\x1b'));
    }
}
