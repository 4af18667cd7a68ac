use crate::colors::Palette;
use serde::Deserialize;
use std::time::Duration;

/// Bounds applied by `Config::sanitize`
pub mod limits {
    pub const FPS_MIN: u32 = 10;
    pub const FPS_MAX: u32 = 60;
    pub const FPS_STEP: i32 = 2;

    pub const WINDOW_MIN: usize = 256;
    pub const WINDOW_MAX: usize = 8192;

    pub const SAMPLE_RATE_MIN: u32 = 8000;
    pub const SAMPLE_RATE_MAX: u32 = 192_000;

    /// Lowest cutoff for either filter stage (Hz)
    pub const CUTOFF_MIN: u32 = 20;
    /// Minimum distance between high-pass and low-pass cutoffs (Hz)
    pub const CUTOFF_GAP: u32 = 20;
    pub const CUTOFF_STEP: i32 = 20;

    pub const DB_MIN: f64 = -120.0;
    pub const DB_MAX: f64 = 0.0;
    /// Minimum dB distance between the two thresholds
    pub const DB_GAP: f64 = 2.0;
    pub const DB_STEP: f64 = 2.0;

    pub const BAR_WIDTH_MIN: usize = 1;
    pub const BAR_WIDTH_CYCLE: usize = 32;
    pub const BAR_SIZE_MAX: usize = 256;
    pub const PADDING_MAX: usize = 8;

    pub const SMOOTHING_WIDTH_MIN: usize = 3;
    pub const SMOOTHING_WIDTH_MAX: usize = 15;

    pub const COLOR_SHIFT_MS_MIN: u64 = 10;
    pub const COLOR_SHIFT_MS_MAX: u64 = 10_000;
}

use limits::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Grouping {
    Log,
    Note,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Smoothing {
    None,
    /// Only replace values close to the smoothed result
    Gated,
    Ungated,
}

impl Smoothing {
    const CYCLE: [Smoothing; 3] = [Smoothing::None, Smoothing::Gated, Smoothing::Ungated];

    fn step(self, by: i32) -> Self {
        let n = Self::CYCLE.len() as i32;
        let pos = Self::CYCLE.iter().position(|&m| m == self).unwrap_or(0) as i32;
        Self::CYCLE[(pos + by).rem_euclid(n) as usize]
    }

    pub fn name(self) -> &'static str {
        match self {
            Smoothing::None => "none",
            Smoothing::Gated => "gated",
            Smoothing::Ungated => "ungated",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Vertical,
    Horizontal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StereoLayout {
    /// Left above right
    Stacked,
    /// Left and right side by side
    Shared,
}

/// Bar extent along one axis
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BarSize {
    /// Cells
    Fixed(usize),
    /// Fraction of the region, in (0, 1]
    Dynamic(f64),
}

/// Attack and decay rates for the motion engine
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionRates {
    pub freq_unique: bool,
    pub freq_up: f64,
    pub freq_down: f64,
    pub peak_unique: bool,
    pub peak_down: f64,
}

impl Default for MotionRates {
    fn default() -> Self {
        Self {
            freq_unique: true,
            freq_up: 0.999_999,
            freq_down: 0.98,
            peak_unique: false,
            peak_down: 0.20,
        }
    }
}

/// Immutable per-tick configuration snapshot
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub fps: u32,
    /// FFT window length, a power of two
    pub window_size: usize,
    pub sample_rate: u32,
    pub low_pass: u32,
    pub high_pass: u32,
    /// Drop spectrum bins outside [high_pass, low_pass]
    pub trim: bool,
    pub threshold_min: f64,
    pub threshold_max: f64,

    pub grouping: Grouping,
    /// 12 for semitones, 24 for quarter tones
    pub octave_scale: u32,
    pub smoothing: Smoothing,
    pub smoothing_width: usize,
    /// Fraction of the dB range used as the gate in `Smoothing::Gated`
    pub smoothing_threshold: f64,

    pub mono: bool,
    pub channel_swap: bool,
    pub layout: StereoLayout,
    pub orientation: Orientation,
    pub flip: bool,
    pub reverse: bool,

    pub bar_width: BarSize,
    pub bar_height: BarSize,
    /// Draw every row of a bar instead of only the top `bar_height` rows
    pub full_height: bool,
    pub linear_height: bool,
    pub padding: usize,

    pub draw_freq: bool,
    pub draw_freq_always: bool,
    pub draw_peak: bool,
    pub draw_peak_always: bool,
    pub peak_reverse: bool,
    pub motion: MotionRates,

    pub color: bool,
    pub alpha: bool,
    pub alpha_blend: f64,
    pub gradient_x: bool,
    pub gradient_y: bool,
    /// Mirror the gradient for the left channel
    pub color_swap: bool,
    pub color_shift: bool,
    /// Milliseconds per degree of hue rotation
    pub color_shift_ms: u64,
    pub palette: Palette,

    pub overlay: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fps: 30,
            window_size: 2048,
            sample_rate: 16_000,
            low_pass: 4000,
            high_pass: 40,
            trim: true,
            threshold_min: -60.0,
            threshold_max: -20.0,
            grouping: Grouping::Log,
            octave_scale: 24,
            smoothing: Smoothing::None,
            smoothing_width: 3,
            smoothing_threshold: 0.10,
            mono: false,
            channel_swap: false,
            layout: StereoLayout::Stacked,
            orientation: Orientation::Vertical,
            flip: false,
            reverse: false,
            bar_width: BarSize::Fixed(1),
            bar_height: BarSize::Dynamic(0.25),
            full_height: true,
            linear_height: true,
            padding: 1,
            draw_freq: true,
            draw_freq_always: true,
            draw_peak: true,
            draw_peak_always: false,
            peak_reverse: false,
            motion: MotionRates::default(),
            color: true,
            alpha: false,
            alpha_blend: 0.3,
            gradient_x: true,
            gradient_y: true,
            color_swap: false,
            color_shift: false,
            color_shift_ms: 100,
            palette: Palette::default(),
            overlay: false,
        }
    }
}

/// A single change to the configuration, applied between ticks
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Delta {
    BarWidth(i32),
    Padding(i32),
    Fps(i32),
    HighPass(i32),
    LowPass(i32),
    ThresholdMin(f64),
    ThresholdMax(f64),
    CycleSmoothing(i32),
    SampleRate(u32),
    ToggleReverse,
    ToggleChannelSwap,
    ToggleGrouping,
    ToggleOverlay,
    ToggleOrientation,
    ToggleMono,
    ToggleLayout,
    ToggleFlip,
    ToggleDrawFreq,
    ToggleDrawFreqAlways,
    ToggleDrawPeak,
    ToggleDrawPeakAlways,
    TogglePeakReverse,
    ToggleColor,
    ToggleAlpha,
    ToggleColorShift,
    ToggleFullHeight,
    ToggleGradientX,
    ToggleGradientY,
    ToggleColorSwap,
    MirrorGradient,
    SetPalette(Palette),
    RotateHue(f64),
}

/// Wrap around instead of saturating.
fn cycle(value: i64, min: i64, max: i64) -> i64 {
    if value < min {
        max
    } else if value > max {
        min
    } else {
        value
    }
}

fn offset(value: u32, by: i32) -> u32 {
    (i64::from(value) + i64::from(by)).max(0) as u32
}

impl Config {
    pub fn tick_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.fps))
    }

    pub fn db_range(&self) -> f64 {
        (self.threshold_max - self.threshold_min).abs()
    }

    /// Gate passed to the smoother, or `None` when smoothing is off.
    pub fn smoothing_gate(&self) -> Option<f64> {
        match self.smoothing {
            Smoothing::None => None,
            Smoothing::Gated => Some(self.db_range() * self.smoothing_threshold),
            Smoothing::Ungated => Some(0.0),
        }
    }

    /// Return a copy with `delta` applied and every bound enforced.
    pub fn apply(&self, delta: Delta) -> Config {
        let mut c = self.clone();
        match delta {
            Delta::BarWidth(by) => {
                c.bar_width = match c.bar_width {
                    BarSize::Fixed(w) => BarSize::Fixed(cycle(
                        w as i64 + i64::from(by),
                        BAR_WIDTH_MIN as i64,
                        BAR_WIDTH_CYCLE as i64,
                    ) as usize),
                    BarSize::Dynamic(_) => BarSize::Fixed(BAR_WIDTH_MIN),
                };
            }
            Delta::Padding(by) => {
                c.padding = cycle(c.padding as i64 + i64::from(by), 0, PADDING_MAX as i64) as usize;
            }
            Delta::Fps(by) => c.fps = offset(c.fps, by),
            Delta::HighPass(by) => c.high_pass = offset(c.high_pass, by),
            Delta::LowPass(by) => c.low_pass = offset(c.low_pass, by),
            Delta::ThresholdMin(by) => c.threshold_min += by,
            Delta::ThresholdMax(by) => c.threshold_max += by,
            Delta::CycleSmoothing(by) => c.smoothing = c.smoothing.step(by),
            Delta::SampleRate(rate) => c.sample_rate = rate,
            Delta::ToggleReverse => c.reverse = !c.reverse,
            Delta::ToggleChannelSwap => c.channel_swap = !c.channel_swap,
            Delta::ToggleGrouping => {
                c.grouping = match c.grouping {
                    Grouping::Log => Grouping::Note,
                    Grouping::Note => Grouping::Log,
                }
            }
            Delta::ToggleOverlay => c.overlay = !c.overlay,
            Delta::ToggleOrientation => {
                c.orientation = match c.orientation {
                    Orientation::Vertical => Orientation::Horizontal,
                    Orientation::Horizontal => Orientation::Vertical,
                }
            }
            Delta::ToggleMono => c.mono = !c.mono,
            Delta::ToggleLayout => {
                c.layout = match c.layout {
                    StereoLayout::Stacked => StereoLayout::Shared,
                    StereoLayout::Shared => StereoLayout::Stacked,
                }
            }
            Delta::ToggleFlip => c.flip = !c.flip,
            Delta::ToggleDrawFreq => c.draw_freq = !c.draw_freq,
            Delta::ToggleDrawFreqAlways => c.draw_freq_always = !c.draw_freq_always,
            Delta::ToggleDrawPeak => c.draw_peak = !c.draw_peak,
            Delta::ToggleDrawPeakAlways => c.draw_peak_always = !c.draw_peak_always,
            Delta::TogglePeakReverse => c.peak_reverse = !c.peak_reverse,
            Delta::ToggleColor => c.color = !c.color,
            Delta::ToggleAlpha => c.alpha = !c.alpha,
            Delta::ToggleColorShift => c.color_shift = !c.color_shift,
            Delta::ToggleFullHeight => c.full_height = !c.full_height,
            Delta::ToggleGradientX => c.gradient_x = !c.gradient_x,
            Delta::ToggleGradientY => c.gradient_y = !c.gradient_y,
            Delta::ToggleColorSwap => c.color_swap = !c.color_swap,
            Delta::MirrorGradient => c.palette = c.palette.mirrored(),
            Delta::SetPalette(palette) => c.palette = palette,
            Delta::RotateHue(degrees) => c.palette = c.palette.rotated(degrees),
        }
        c.sanitize()
    }

    /// Clamp every field into range. Out-of-range values are never rejected.
    pub fn sanitize(mut self) -> Config {
        self.fps = self.fps.clamp(FPS_MIN, FPS_MAX);
        self.window_size = self
            .window_size
            .clamp(WINDOW_MIN, WINDOW_MAX)
            .next_power_of_two()
            .min(WINDOW_MAX);
        self.sample_rate = self.sample_rate.clamp(SAMPLE_RATE_MIN, SAMPLE_RATE_MAX);

        let nyquist = self.sample_rate / 2;
        self.low_pass = self.low_pass.clamp(CUTOFF_MIN + CUTOFF_GAP, nyquist);
        self.high_pass = self.high_pass.clamp(CUTOFF_MIN, self.low_pass - CUTOFF_GAP);

        if !self.threshold_min.is_finite() {
            self.threshold_min = DB_MIN;
        }
        if !self.threshold_max.is_finite() {
            self.threshold_max = DB_MAX;
        }
        self.threshold_min = self.threshold_min.clamp(DB_MIN, DB_MAX - DB_GAP);
        self.threshold_max = self.threshold_max.clamp(self.threshold_min + DB_GAP, DB_MAX);

        self.octave_scale = if self.octave_scale <= 12 { 12 } else { 24 };
        self.smoothing_width = self
            .smoothing_width
            .clamp(SMOOTHING_WIDTH_MIN, SMOOTHING_WIDTH_MAX)
            | 1;
        self.smoothing_threshold = clamp_unit(self.smoothing_threshold);

        self.bar_width = clamp_bar_size(self.bar_width);
        self.bar_height = clamp_bar_size(self.bar_height);
        self.padding = self.padding.min(PADDING_MAX);

        self.motion.freq_up = clamp_unit(self.motion.freq_up);
        self.motion.freq_down = clamp_unit(self.motion.freq_down);
        self.motion.peak_down = clamp_unit(self.motion.peak_down);

        self.alpha_blend = clamp_unit(self.alpha_blend);
        self.color_shift_ms = self.color_shift_ms.clamp(COLOR_SHIFT_MS_MIN, COLOR_SHIFT_MS_MAX);
        self
    }
}

fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

fn clamp_bar_size(size: BarSize) -> BarSize {
    match size {
        BarSize::Fixed(n) => BarSize::Fixed(n.clamp(1, BAR_SIZE_MAX)),
        BarSize::Dynamic(f) if f.is_finite() => BarSize::Dynamic(f.clamp(0.01, 1.0)),
        BarSize::Dynamic(_) => BarSize::Dynamic(1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_already_sane() {
        let c = Config::default();
        assert_eq!(c.clone().sanitize(), c);
    }

    #[test]
    fn window_size_rounds_up_to_power_of_two() {
        let c = Config { window_size: 3000, ..Config::default() }.sanitize();
        assert_eq!(c.window_size, 4096);
        let c = Config { window_size: 1, ..Config::default() }.sanitize();
        assert_eq!(c.window_size, WINDOW_MIN);
        let c = Config { window_size: 1 << 20, ..Config::default() }.sanitize();
        assert_eq!(c.window_size, WINDOW_MAX);
    }

    #[test]
    fn cutoffs_stay_ordered_and_below_nyquist() {
        let c = Config { low_pass: 20_000, high_pass: 30_000, ..Config::default() }.sanitize();
        assert_eq!(c.low_pass, c.sample_rate / 2);
        assert!(c.high_pass < c.low_pass);

        let lowered = c.apply(Delta::SampleRate(8000));
        assert_eq!(lowered.low_pass, 4000);
        assert!(lowered.high_pass + CUTOFF_GAP <= lowered.low_pass);
    }

    #[test]
    fn thresholds_keep_a_gap() {
        let mut c = Config::default();
        for _ in 0..40 {
            c = c.apply(Delta::ThresholdMin(DB_STEP));
        }
        assert!(c.threshold_min < c.threshold_max);
        assert!(c.threshold_max <= DB_MAX);

        let c = Config { threshold_min: f64::NEG_INFINITY, ..Config::default() }.sanitize();
        assert_eq!(c.threshold_min, DB_MIN);
    }

    #[test]
    fn bar_width_and_padding_wrap_around() {
        let c = Config::default().apply(Delta::BarWidth(-1));
        assert_eq!(c.bar_width, BarSize::Fixed(BAR_WIDTH_CYCLE));
        let c = c.apply(Delta::BarWidth(1));
        assert_eq!(c.bar_width, BarSize::Fixed(1));

        let c = Config { padding: PADDING_MAX, ..Config::default() }.apply(Delta::Padding(1));
        assert_eq!(c.padding, 0);
    }

    #[test]
    fn fps_is_clamped() {
        let c = Config { fps: 59, ..Config::default() }.apply(Delta::Fps(FPS_STEP));
        assert_eq!(c.fps, FPS_MAX);
        let c = Config { fps: 0, ..Config::default() }.sanitize();
        assert_eq!(c.fps, FPS_MIN);
        assert_eq!(Config::default().tick_period(), Duration::from_secs_f64(1.0 / 30.0));
    }

    #[test]
    fn smoothing_cycles_both_ways() {
        let c = Config::default();
        assert_eq!(c.apply(Delta::CycleSmoothing(1)).smoothing, Smoothing::Gated);
        assert_eq!(c.apply(Delta::CycleSmoothing(-1)).smoothing, Smoothing::Ungated);
        assert_eq!(c.smoothing_gate(), None);

        let gated = c.apply(Delta::CycleSmoothing(1));
        assert!((gated.smoothing_gate().unwrap() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn smoothing_width_is_odd() {
        let c = Config { smoothing_width: 4, ..Config::default() }.sanitize();
        assert_eq!(c.smoothing_width, 5);
        let c = Config { smoothing_width: 100, ..Config::default() }.sanitize();
        assert_eq!(c.smoothing_width, SMOOTHING_WIDTH_MAX);
    }

    #[test]
    fn toggles_flip_back() {
        let c = Config::default();
        let twice = c.apply(Delta::ToggleGrouping).apply(Delta::ToggleGrouping);
        assert_eq!(twice, c);
        assert_eq!(c.apply(Delta::ToggleOrientation).orientation, Orientation::Horizontal);
    }
}
