//! Bars and peak markers into the cell buffer.

use super::bars::{bar_units, BarSet};
use crate::colors::{gradient, Hsla, Palette, Rgba};
use crate::config::{Config, Orientation};
use crate::screen::{Attrs, Buffer, Pos, Style};

pub const BAR_Z: i32 = 1;

const VERTICAL: [&str; 8] = ["▁", "▂", "▃", "▄", "▅", "▆", "▇", "█"];
const HORIZONTAL: [&str; 8] = ["▏", "▎", "▍", "▌", "▋", "▊", "▉", "█"];
const FULL: usize = 7;

/// How one region is drawn
#[derive(Clone, Copy, Debug)]
pub struct Pass<'a> {
    pub palette: &'a Palette,
    /// Bars grow from the top of the region
    pub flip: bool,
    /// Bars are laid out right to left
    pub mirror: bool,
}

/// Alpha for a row `y` cells up a region `height` cells tall.
fn alpha_at(y: f64, height: usize, blend: f64) -> u8 {
    let d = (y + blend) / height as f64;
    if d >= blend {
        255
    } else {
        ((d / blend) * 255.0 + 16.0).round().clamp(16.0, 255.0) as u8
    }
}

/// Horizontal span of bar `x`, clipped to the region.
fn span(bars: &BarSet, x: usize, mirror: bool) -> Option<(usize, usize)> {
    let width = bars.width as i64;
    let bw = bars.bar_width as i64;
    let step = x as i64 * (bars.bar_width + bars.padding) as i64;
    let (mut pos, mut w) = if mirror {
        let pos = width - bw - bars.margin_lhs as i64 - step;
        (pos, if pos + bw > width { width - pos } else { bw })
    } else {
        let pos = bars.margin_lhs as i64 + step;
        (pos, if pos + bw > width { width - pos } else { bw })
    };
    if pos < 0 {
        w += pos;
        pos = 0;
    }
    (w > 0).then_some((pos as usize, w as usize))
}

struct Painter<'a> {
    buf: &'a mut Buffer,
    vertical: bool,
    x_begin: usize,
    y_begin: usize,
    x_pos: usize,
    width: usize,
}

impl Painter<'_> {
    fn pos(&self, x: usize, y: usize) -> Pos {
        let (px, py) = (self.x_begin + x, self.y_begin + y);
        if self.vertical {
            Pos::new(px as i32, py as i32)
        } else {
            Pos::new(py as i32, px as i32)
        }
    }

    fn row(&mut self, y: usize, style: Style, glyph: &str) {
        for i in 0..self.width {
            let pos = self.pos(self.x_pos + i, y);
            self.buf.compose(pos, BAR_Z, style, glyph);
        }
    }

    /// Nothing has been drawn at the start of row `y`.
    fn is_empty(&self, y: usize) -> bool {
        self.buf
            .get(self.pos(self.x_pos, y))
            .is_some_and(|c| c.glyph.is_empty() || c.glyph == " ")
    }
}

/// Shading for one bar column.
struct Shade<'a> {
    cfg: &'a Config,
    stops: [Hsla; 4],
    tx: Option<f64>,
    height: usize,
}

impl Shade<'_> {
    fn color(&self, ty: Option<f64>, row: usize) -> Rgba {
        let ty = if self.cfg.gradient_y { ty } else { None };
        let mut c = gradient(&self.stops, self.tx, ty);
        if self.cfg.alpha {
            c = c.with_alpha(alpha_at(row as f64, self.height, self.cfg.alpha_blend));
        }
        Rgba::from(c)
    }

    fn row_t(&self, row: usize) -> Option<f64> {
        (self.height > 1).then(|| row as f64 / (self.height - 1) as f64)
    }
}

/// Draw every bar in `bars`, plus peaks, into `buf`.
pub fn draw_bars(buf: &mut Buffer, bars: &BarSet, cfg: &Config, pass: Pass<'_>) {
    if !(cfg.draw_freq || cfg.draw_peak) || bars.count == 0 {
        return;
    }
    let vertical = cfg.orientation == Orientation::Vertical;
    let glyphs = if vertical { &VERTICAL } else { &HORIZONTAL };
    let height = bars.height;
    let flip = pass.flip;
    let bg = pass.palette.background;
    let min = cfg.threshold_min;
    let y_of = |cells: usize| if flip { (height - 1).saturating_sub(cells) } else { cells };

    let tx_of = |x: usize| {
        (cfg.gradient_x && bars.count > 1).then(|| x as f64 / (bars.count - 1) as f64)
    };
    let plain = |reverse: bool| Style::plain(if reverse { Attrs::REVERSE } else { Attrs::NONE });

    for x in 0..bars.count {
        let index = if cfg.reverse { bars.count - 1 - x } else { x };
        let (Some(&value), Some(&peak)) = (bars.displayed.get(index), bars.peak.get(index)) else {
            continue;
        };
        let Some((x_pos, width)) = span(bars, x, pass.mirror) else {
            continue;
        };
        if height == 0 {
            continue;
        }
        let mut paint = Painter { buf: &mut *buf, vertical, x_begin: bars.x, y_begin: bars.y, x_pos, width };

        if cfg.draw_freq && (cfg.draw_freq_always || value > min) {
            let shade = Shade { cfg, stops: pass.palette.stops, tx: tx_of(x), height };
            let units = bar_units(value, height, cfg);
            let cells = units / 8;
            let frac = units % 8;
            let tip = if flip { FULL - if frac != 0 { frac } else { 1 } } else { frac };
            let mut bottom_drawn = false;

            for y in 0..cells {
                let row = y_of(y);
                let color = shade.color(shade.row_t(y), y);
                let full = if cfg.color { Style::color(color, bg) } else { plain(false) };

                if cfg.full_height {
                    paint.row(row, full, glyphs[FULL]);
                } else if cells <= bars.bar_height || y >= cells - bars.bar_height {
                    if bottom_drawn || (y == 0 && bars.bar_height > cells) {
                        paint.row(row, full, glyphs[FULL]);
                    } else {
                        // Lower edge of a floating block mirrors the tip.
                        let style = match (cfg.color, flip) {
                            (true, true) => Style::color(color, bg),
                            (true, false) => Style::color(bg, color),
                            (false, reverse) => plain(!reverse),
                        };
                        paint.row(row, style, glyphs[tip]);
                    }
                    bottom_drawn = true;
                }
            }

            let ty = Some(units as f64 / (height * 8) as f64);
            let color = shade.color(ty, cells);
            let style = match (cfg.color, flip) {
                (true, true) => Style::color(bg, color),
                (true, false) => Style::color(color, bg),
                (false, reverse) => plain(reverse),
            };
            paint.row(y_of(cells), style, glyphs[tip]);
        }

        if cfg.draw_peak && (cfg.draw_peak_always || peak > min) && peak >= value {
            let cells = bar_units(peak, height, cfg) / 8;
            let row = y_of(cells);
            if cells >= height || !paint.is_empty(row) {
                continue;
            }
            let tip = if flip { 6 } else { 0 };
            let shade = Shade { cfg, stops: pass.palette.peak_stops(), tx: tx_of(x), height };
            let style = if cfg.color {
                let color = shade.color(shade.row_t(cells), cells);
                if flip {
                    Style::color(bg, color)
                } else {
                    Style::color(color, bg)
                }
            } else {
                plain(flip)
            };
            paint.row(row, style, glyphs[tip]);
        }
    }
}
