use crate::config::{BarSize, Config, Orientation};
use crate::dsp::{scale, scale_log};

/// Bars drawn into one screen region, with their per-bar state.
///
/// `raw`, `displayed`, `peak` and `freq` always hold `count` entries.
#[derive(Clone, Debug, Default)]
pub struct BarSet {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
    pub margin_lhs: usize,
    pub margin_rhs: usize,

    pub count: usize,
    pub bar_width: usize,
    pub bar_height: usize,
    pub padding: usize,

    pub raw: Vec<f64>,
    pub displayed: Vec<f64>,
    pub peak: Vec<f64>,
    /// Dominant frequency of each bar (Hz)
    pub freq: Vec<f64>,
}

impl BarSet {
    pub fn set_region(&mut self, x: usize, y: usize, width: usize, height: usize) {
        self.x = x;
        self.y = y;
        self.width = width;
        self.height = height;
    }

    /// Derive bar size and count from the region, then resize the state
    /// arrays. New bars start at `floor`.
    pub fn layout(&mut self, cfg: &Config, floor: f64) {
        let vertical = cfg.orientation == Orientation::Vertical;
        self.padding = padding(cfg);

        self.bar_width = match cfg.bar_width {
            BarSize::Dynamic(f) => ((self.width as f64 * f) as usize).max(1),
            BarSize::Fixed(w) => {
                let w = w.min(self.width).max(1);
                if vertical {
                    w
                } else {
                    (w / 2).max(1)
                }
            }
        };

        self.bar_height = match cfg.bar_height {
            BarSize::Dynamic(f) => ((self.height as f64 * f) as usize).max(1),
            BarSize::Fixed(h) => {
                let h = if vertical { h } else { h * 2 };
                h.min(self.height).max(1)
            }
        };

        let usable = self.width.saturating_sub(self.margin_lhs + self.margin_rhs);
        let unit = self.bar_width + self.padding;
        self.count = if usable == 0 {
            1
        } else {
            (usable / unit + usize::from(usable % unit != 0)).max(1)
        };

        self.resize(floor);
    }

    fn resize(&mut self, floor: f64) {
        let n = self.count;
        self.raw.resize(n, floor);
        self.displayed.resize(n, floor);
        self.peak.resize(n, floor);
        self.freq.resize(n, 0.0);
    }

    /// Drop all motion state back to `floor`.
    pub fn reset(&mut self, floor: f64) {
        self.raw.fill(floor);
        self.displayed.fill(floor);
        self.peak.fill(floor);
    }
}

/// Gap between bars; horizontal bars use half the configured padding.
pub fn padding(cfg: &Config) -> usize {
    if cfg.orientation == Orientation::Horizontal && cfg.padding > 1 {
        cfg.padding / 2
    } else {
        cfg.padding
    }
}

/// Height of `value` in eighths of a cell, for a region `height` cells tall.
pub fn bar_units(value: f64, height: usize, cfg: &Config) -> usize {
    let top = height as f64 * 8.0 - 1.0;
    if top <= 0.0 {
        return 0;
    }
    let (min, max) = (cfg.threshold_min, cfg.threshold_max);
    let units = if cfg.linear_height {
        scale(value, min, max, 0.0, top).trunc()
    } else {
        (scale_log(value, min, max, 1.0, top + 0.001).trunc() - 1.0) * 2.0
    };
    if units.is_nan() {
        0
    } else {
        units.clamp(0.0, top) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(width: usize, height: usize) -> BarSet {
        let mut bars = BarSet::default();
        bars.set_region(0, 0, width, height);
        bars
    }

    #[test]
    fn fixed_width_bars_fill_the_row() {
        let cfg = Config::default();
        let mut bars = region(80, 24);
        bars.layout(&cfg, -60.0);
        assert_eq!((bars.bar_width, bars.padding), (1, 1));
        assert_eq!(bars.count, 40);

        let mut bars = region(81, 24);
        bars.layout(&cfg, -60.0);
        assert_eq!(bars.count, 41);
        assert_eq!(bars.raw.len(), 41);
        assert_eq!(bars.peak.len(), 41);
    }

    #[test]
    fn dynamic_sizes_scale_with_region() {
        let cfg = Config {
            bar_width: BarSize::Dynamic(0.1),
            bar_height: BarSize::Dynamic(0.25),
            padding: 0,
            ..Config::default()
        };
        let mut bars = region(100, 40);
        bars.layout(&cfg, -60.0);
        assert_eq!(bars.bar_width, 10);
        assert_eq!(bars.bar_height, 10);
        assert_eq!(bars.count, 10);
    }

    #[test]
    fn horizontal_halves_width_and_padding() {
        let cfg = Config {
            orientation: Orientation::Horizontal,
            bar_width: BarSize::Fixed(4),
            bar_height: BarSize::Fixed(3),
            padding: 4,
            ..Config::default()
        };
        let mut bars = region(30, 20);
        bars.layout(&cfg, -60.0);
        assert_eq!((bars.bar_width, bars.padding, bars.bar_height), (2, 2, 6));
    }

    #[test]
    fn margins_and_empty_regions() {
        let cfg = Config::default();
        let mut bars = region(10, 5);
        bars.margin_lhs = 4;
        bars.layout(&cfg, -60.0);
        assert_eq!(bars.count, 3);

        let mut bars = region(0, 0);
        bars.layout(&cfg, -60.0);
        assert_eq!(bars.count, 1);
    }

    #[test]
    fn shrinking_keeps_arrays_in_step() {
        let cfg = Config::default();
        let mut bars = region(80, 24);
        bars.layout(&cfg, -60.0);
        bars.set_region(0, 0, 20, 24);
        bars.layout(&cfg, -60.0);
        assert_eq!(bars.count, 10);
        assert_eq!(bars.displayed.len(), 10);
        assert_eq!(bars.freq.len(), 10);
    }

    #[test]
    fn heights_span_the_region() {
        let cfg = Config::default();
        assert_eq!(bar_units(-60.0, 10, &cfg), 0);
        assert_eq!(bar_units(-20.0, 10, &cfg), 79);
        assert_eq!(bar_units(-100.0, 10, &cfg), 0);
        assert_eq!(bar_units(0.0, 10, &cfg), 79);
        assert_eq!(bar_units(-40.0, 0, &cfg), 0);

        let log = Config { linear_height: false, ..Config::default() };
        assert_eq!(bar_units(-60.0, 10, &log), 0);
        assert!(bar_units(-40.0, 10, &log) < bar_units(-40.0, 10, &cfg));
    }
}
