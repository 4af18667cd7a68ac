//! Per-tick easing of displayed values and peaks toward the raw bar values.
//!
//! Exponential ("unique") rates are frame-rate independent: a rate `r`
//! moves `1 - (1 - r)^dt` of the remaining distance in `dt` seconds.
//! Linear rates move `range * r * dt` dB, capped at the remaining distance.

use super::bars::BarSet;
use crate::config::{Config, MotionRates};
use crate::dsp::lerp;

/// Snap distance at the floor and ceiling (dB)
const EPSILON: f64 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionParams {
    pub min: f64,
    pub max: f64,
    pub rates: MotionRates,
    pub peak_reverse: bool,
}

impl MotionParams {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            min: cfg.threshold_min,
            max: cfg.threshold_max,
            rates: cfg.motion,
            peak_reverse: cfg.peak_reverse,
        }
    }

    fn range(&self) -> f64 {
        (self.max - self.min).abs()
    }

    fn clamp(&self, v: f64) -> f64 {
        if v - EPSILON < self.min {
            self.min
        } else if v > self.max {
            self.max
        } else {
            v
        }
    }
}

fn ease(from: f64, to: f64, rate: f64, dt: f64) -> f64 {
    lerp(from, to, 1.0 - (1.0 - rate).powf(dt))
}

fn approach(from: f64, to: f64, step: f64) -> f64 {
    if (to - from).abs() <= step {
        to
    } else if to > from {
        from + step
    } else {
        from - step
    }
}

/// Advance every bar in `bars` by `dt` seconds.
pub fn advance(bars: &mut BarSet, dt: f64, p: &MotionParams) {
    let r = &p.rates;
    let range = p.range();

    for i in 0..bars.count.min(bars.raw.len()) {
        let raw = bars.raw[i];
        let mut shown = bars.displayed[i];
        let mut peak = bars.peak[i];

        let rate = if raw > shown { r.freq_up } else { r.freq_down };
        shown = if r.freq_unique {
            ease(shown, raw, rate, dt)
        } else {
            approach(shown, raw, range * rate * dt)
        };
        shown = p.clamp(shown);

        if peak > shown {
            peak = match (r.peak_unique, p.peak_reverse) {
                (true, false) => ease(peak, shown, r.peak_down, dt),
                (true, true) => ease(peak, p.max, r.peak_down, dt),
                (false, false) => approach(peak, shown, range * r.peak_down * dt),
                (false, true) => peak + range * r.peak_down * dt,
            };
        } else {
            peak = shown;
        }
        if p.peak_reverse && peak + EPSILON > p.max {
            peak = p.min;
        }
        peak = p.clamp(peak);

        bars.displayed[i] = shown;
        bars.peak[i] = peak;
    }
}
