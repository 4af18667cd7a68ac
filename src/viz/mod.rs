//! Spectrum visualizer
//!
//! Each tick `update` turns the capture windows into bar values and eases
//! them; `draw` lays the bars out into the frame buffer.

pub mod bars;
pub mod draw;
pub mod grouping;
pub mod motion;
pub mod overlay;

use crate::audio::capture::Capture;
use crate::audio::spectrum::{Analyzer, SpectrumParams};
use crate::config::{Config, Delta, Grouping, Orientation, StereoLayout};
use crate::dsp::smooth::savitzky_golay;
use crate::colors::Rgba;
use crate::help::render_help_overlay;
use crate::keys::HELP;
use crate::screen::{Buffer, Style};
use bars::BarSet;
use draw::{draw_bars, Pass};
use grouping::{group_log, group_note, Bins};
use motion::{advance, MotionParams};
pub use overlay::Stats;

const HELP_BORDER: Rgba = Rgba::opaque(0xf0, 0xf0, 0xf0);
const HELP_TEXT: Rgba = Rgba::opaque(0xc0, 0xc0, 0xc0);

pub struct Visualizer {
    analyzer: Analyzer,
    left: BarSet,
    right: BarSet,
    /// Milliseconds of color shift not yet applied
    hue_ms: f64,
    status_scroll: usize,
    pub show_help: bool,
}

impl Visualizer {
    pub fn new(cfg: &Config) -> Self {
        Self {
            analyzer: Analyzer::new(cfg.window_size),
            left: BarSet::default(),
            right: BarSet::default(),
            hue_ms: 0.0,
            status_scroll: 0,
            show_help: false,
        }
    }

    #[cfg(test)]
    pub fn left(&self) -> &BarSet {
        &self.left
    }

    #[cfg(test)]
    pub fn right(&self) -> &BarSet {
        &self.right
    }

    pub fn scroll_status(&mut self, by: i32) {
        self.status_scroll = self.status_scroll.saturating_add_signed(by as isize);
    }

    /// Drop all bar motion back to the floor.
    pub fn reset(&mut self, cfg: &Config) {
        self.left.reset(cfg.threshold_min);
        self.right.reset(cfg.threshold_min);
        self.hue_ms = 0.0;
    }

    fn layout(&mut self, cfg: &Config, cols: usize, rows: usize) {
        let vertical = cfg.orientation == Orientation::Vertical;
        let (width, height) = if vertical { (cols, rows) } else { (rows, cols) };
        let (left, right) = (&mut self.left, &mut self.right);
        left.margin_lhs = 0;
        left.margin_rhs = 0;
        right.margin_lhs = 0;
        right.margin_rhs = 0;

        if cfg.mono {
            left.set_region(0, 0, width, height);
        } else if cfg.layout == StereoLayout::Stacked {
            let half = height / 2;
            let rem = height % 2;
            if vertical {
                left.set_region(0, half, width, half + rem);
                right.set_region(0, 0, width, half);
            } else {
                left.set_region(0, 0, width, half + rem);
                right.set_region(0, half + rem, width, half);
            }
        } else {
            let half = width / 2;
            let rem = width % 2;
            let pad = bars::padding(cfg);
            if vertical {
                left.set_region(0, 0, half + rem, height);
                left.margin_lhs = pad / 2 + pad % 2;
                right.set_region(half + rem, 0, half, height);
                right.margin_lhs = pad / 2;
            } else {
                left.set_region(half + rem, 0, half, height);
                left.margin_lhs = pad / 2;
                right.set_region(0, 0, half + rem, height);
                right.margin_lhs = pad / 2 + pad % 2;
            }
        }

        let floor = cfg.threshold_min;
        left.layout(cfg, floor);
        if !cfg.mono {
            right.layout(cfg, floor);
        }
    }

    /// Advance one tick of `dt` seconds. Returns the hue rotation due, if any.
    pub fn update(&mut self, cfg: &Config, capture: &Capture, cols: usize, rows: usize, dt: f64) -> Option<Delta> {
        self.analyzer.resize(cfg.window_size);
        let params = SpectrumParams {
            sample_rate: cfg.sample_rate,
            low_pass: cfg.low_pass,
            high_pass: cfg.high_pass,
            trim: cfg.trim,
            floor: cfg.threshold_min,
            channels: capture.channels(),
        };
        self.analyzer.refresh(capture, &params);

        self.layout(cfg, cols, rows);
        let bins = Bins {
            width: params.bin_width(self.analyzer.window_size()),
            base: params.base_frequency(),
        };

        let motion = MotionParams::from_config(cfg);
        group(self.analyzer.spectrum(0), bins, cfg, &mut self.left);
        if cfg.mono {
            advance(&mut self.left, dt, &motion);
        } else {
            group(self.analyzer.spectrum(1), bins, cfg, &mut self.right);
            if cfg.channel_swap {
                std::mem::swap(&mut self.left.raw, &mut self.right.raw);
                std::mem::swap(&mut self.left.freq, &mut self.right.freq);
                for set in [&mut self.left, &mut self.right] {
                    set.raw.resize(set.count, cfg.threshold_min);
                    set.freq.resize(set.count, 0.0);
                }
            }
            advance(&mut self.left, dt, &motion);
            advance(&mut self.right, dt, &motion);
        }

        self.shift_hue(cfg, dt)
    }

    fn shift_hue(&mut self, cfg: &Config, dt: f64) -> Option<Delta> {
        if !(cfg.color && cfg.color_shift) {
            self.hue_ms = 0.0;
            return None;
        }
        let period = cfg.color_shift_ms as f64;
        self.hue_ms += dt * 1000.0;
        let steps = (self.hue_ms / period).floor();
        if steps < 1.0 {
            return None;
        }
        self.hue_ms -= steps * period;
        Some(Delta::RotateHue(-steps))
    }

    /// Compose the current bars, overlay and help into `buf`.
    pub fn draw(&mut self, cfg: &Config, buf: &mut Buffer, stats: &Stats) {
        let palette = cfg.palette;
        let left_palette = if cfg.color_swap { palette.mirrored() } else { palette };
        let flip = cfg.flip;

        if cfg.mono {
            let pass = Pass { palette: &left_palette, flip, mirror: false };
            draw_bars(buf, &self.left, cfg, pass);
        } else {
            let vertical = cfg.orientation == Orientation::Vertical;
            let (l, r) = match (vertical, cfg.layout) {
                // Right channel hangs below the center line.
                (true, StereoLayout::Stacked) => ((flip, false), (!flip, false)),
                (true, StereoLayout::Shared) => ((flip, true), (flip, false)),
                (false, StereoLayout::Stacked) => ((!flip, false), (flip, false)),
                (false, StereoLayout::Shared) => ((flip, false), (flip, true)),
            };
            draw_bars(buf, &self.left, cfg, Pass { palette: &left_palette, flip: l.0, mirror: l.1 });
            draw_bars(buf, &self.right, cfg, Pass { palette: &palette, flip: r.0, mirror: r.1 });
        }

        if cfg.overlay {
            let labels = (cfg.mono || cfg.layout == StereoLayout::Stacked)
                && cfg.orientation == Orientation::Vertical
                && !cfg.reverse;
            if labels {
                overlay::draw_labels(buf, &self.left, cfg);
            }
            overlay::draw_status(buf, cfg, stats, &mut self.status_scroll);
        }

        if self.show_help {
            let (border, text) = if cfg.color {
                (
                    Style::color(HELP_BORDER, palette.background),
                    Style::color(HELP_TEXT, palette.background),
                )
            } else {
                (Style::default(), Style::default())
            };
            render_help_overlay(buf, HELP, border, text);
        }
    }
}

/// Spectrum to `raw`/`freq` for one bar set, then optional smoothing.
fn group(spectrum: &[f64], bins: Bins, cfg: &Config, bars: &mut BarSet) {
    let (min, max) = (cfg.threshold_min, cfg.threshold_max);
    let n = bars.count;
    if spectrum.is_empty() {
        bars.raw[..n].fill(min);
        return;
    }
    let (raw, freq) = (&mut bars.raw[..n], &mut bars.freq[..n]);
    match cfg.grouping {
        Grouping::Log => group_log(spectrum, bins, min, max, raw, freq),
        Grouping::Note => group_note(spectrum, bins, cfg.octave_scale, min, max, raw, freq),
    }
    if let Some(gate) = cfg.smoothing_gate() {
        savitzky_golay(raw, cfg.smoothing_width, gate);
    }
}
