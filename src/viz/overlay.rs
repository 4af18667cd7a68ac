use super::bars::BarSet;
use super::grouping::Note;
use crate::colors::Rgba;
use crate::config::{Config, Grouping};
use crate::screen::{Buffer, Pos, Style};

pub const OVERLAY_Z: i32 = 2;

const LABEL_EVEN: Rgba = Rgba::opaque(0xf0, 0xf0, 0xf0);
const LABEL_ODD: Rgba = Rgba::opaque(0xc0, 0xc0, 0xc0);

/// Runtime numbers shown on the status line
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    pub actual_fps: u32,
    pub dropped: u64,
    pub recording: bool,
}

pub fn status_line(cfg: &Config, stats: &Stats) -> String {
    let grouping = match cfg.grouping {
        Grouping::Log => "log",
        Grouping::Note => "note",
    };
    let mut line = format!(
        "frequency {}:{} | decibels {}:{} | smoothing {} | grouping {} | fps {}/{} | dropped {}",
        cfg.high_pass,
        cfg.low_pass,
        cfg.threshold_min as i64,
        cfg.threshold_max as i64,
        cfg.smoothing.name(),
        grouping,
        cfg.fps,
        stats.actual_fps,
        stats.dropped,
    );
    if !stats.recording {
        line.push_str(" | paused");
    }
    line
}

/// Part of `line` visible in `width` columns starting at `scroll`.
/// `scroll` is clamped so the end of the line stays on screen.
pub fn visible(line: &str, width: usize, scroll: &mut usize) -> String {
    let len = line.chars().count();
    if len <= width {
        *scroll = 0;
        return line.to_string();
    }
    *scroll = (*scroll).min(len - width);
    line.chars().skip(*scroll).take(width).collect()
}

fn style(cfg: &Config, fg: Rgba) -> Style {
    if cfg.color {
        Style::color(fg, cfg.palette.background)
    } else {
        Style::default()
    }
}

/// Status line centered on the bottom row.
pub fn draw_status(buf: &mut Buffer, cfg: &Config, stats: &Stats, scroll: &mut usize) {
    let text = visible(&status_line(cfg, stats), buf.cols(), scroll);
    let x = (buf.cols() / 2).saturating_sub(text.chars().count() / 2);
    buf.move_to(Pos::new(x as i32, 0));
    buf.put(&text, style(cfg, LABEL_EVEN), OVERLAY_Z);
}

/// Frequency and note name of each bar, written top-down above it.
pub fn draw_labels(buf: &mut Buffer, bars: &BarSet, cfg: &Config) {
    let top = buf.rows() as i32 - 1;
    let step = bars.bar_width + bars.padding;
    let mut utf8 = [0u8; 4];
    for (i, &freq) in bars.freq.iter().take(bars.count).enumerate() {
        if freq <= 0.0 {
            continue;
        }
        let x = (bars.x + bars.margin_lhs + i * step) as i32;
        let fg = if i % 2 == 1 { LABEL_ODD } else { LABEL_EVEN };
        let label = format!("{} {}", freq.trunc() as i64, Note::new(freq, cfg.octave_scale));
        for (row, ch) in label.chars().enumerate() {
            let y = top - row as i32;
            if y < 0 {
                break;
            }
            buf.compose(Pos::new(x, y), OVERLAY_Z, style(cfg, fg), ch.encode_utf8(&mut utf8));
        }
    }
}
