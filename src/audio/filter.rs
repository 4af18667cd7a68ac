//! Second-order IIR stages used to condition captured samples.
//!
//! Coefficients follow the RBJ audio EQ cookbook and are normalized by `a0`.

use std::f64::consts::PI;

/// Quality factor for the low-pass and high-pass stages
pub const Q: f64 = 1.0;
/// Shelf slope
pub const SHELF_SLOPE: f64 = 1.0;
/// Shelf boost (dB)
pub const SHELF_GAIN_DB: f64 = 3.0;
/// Shelf corner (Hz)
pub const SHELF_FREQ: f64 = 1000.0;

/// Normalized biquad coefficients (`a0 == 1`)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coefficients {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl Coefficients {
    /// Identity filter
    pub const PASS: Coefficients = Coefficients { b0: 1.0, b1: 0.0, b2: 0.0, a1: 0.0, a2: 0.0 };

    fn normalized(b: [f64; 3], a: [f64; 3]) -> Self {
        Self {
            b0: b[0] / a[0],
            b1: b[1] / a[0],
            b2: b[2] / a[0],
            a1: a[1] / a[0],
            a2: a[2] / a[0],
        }
    }
}

/// Filter design. Each kind maps its parameters to coefficients.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Design {
    LowPass { freq: f64, q: f64 },
    HighPass { freq: f64, q: f64 },
    HighShelf { freq: f64, slope: f64, gain_db: f64 },
}

impl Design {
    pub fn coefficients(&self, sample_rate: f64) -> Coefficients {
        match *self {
            Design::LowPass { freq, q } => {
                let (cos, alpha) = angular(freq, sample_rate, q);
                Coefficients::normalized(
                    [(1.0 - cos) / 2.0, 1.0 - cos, (1.0 - cos) / 2.0],
                    [1.0 + alpha, -2.0 * cos, 1.0 - alpha],
                )
            }
            Design::HighPass { freq, q } => {
                let (cos, alpha) = angular(freq, sample_rate, q);
                Coefficients::normalized(
                    [(1.0 + cos) / 2.0, -(1.0 + cos), (1.0 + cos) / 2.0],
                    [1.0 + alpha, -2.0 * cos, 1.0 - alpha],
                )
            }
            Design::HighShelf { freq, slope, gain_db } => {
                let a = 10f64.powf(gain_db / 40.0);
                let w = 2.0 * PI * freq / sample_rate;
                let cos = w.cos();
                let alpha = w.sin() / 2.0 * ((a + 1.0 / a) * (1.0 / slope - 1.0) + 2.0).sqrt();
                let beta = 2.0 * a.sqrt() * alpha;
                Coefficients::normalized(
                    [
                        a * ((a + 1.0) + (a - 1.0) * cos + beta),
                        -2.0 * a * ((a - 1.0) + (a + 1.0) * cos),
                        a * ((a + 1.0) + (a - 1.0) * cos - beta),
                    ],
                    [
                        (a + 1.0) - (a - 1.0) * cos + beta,
                        2.0 * ((a - 1.0) - (a + 1.0) * cos),
                        (a + 1.0) - (a - 1.0) * cos - beta,
                    ],
                )
            }
        }
    }
}

fn angular(freq: f64, sample_rate: f64, q: f64) -> (f64, f64) {
    let w = 2.0 * PI * freq / sample_rate;
    (w.cos(), w.sin() / (2.0 * q))
}

/// One biquad stage: coefficients plus two samples of input and output history.
#[derive(Clone, Debug)]
pub struct Biquad {
    coeffs: Coefficients,
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl Biquad {
    pub fn new(coeffs: Coefficients) -> Self {
        Self { coeffs, x1: 0.0, x2: 0.0, y1: 0.0, y2: 0.0 }
    }

    #[inline]
    pub fn process(&mut self, x: f64) -> f64 {
        let c = &self.coeffs;
        let y = c.b0 * x + c.b1 * self.x1 - c.a1 * self.y1 + c.b2 * self.x2 - c.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;
        y
    }

    pub fn clear(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }

    /// Swap in new coefficients and drop the history.
    pub fn set(&mut self, coeffs: Coefficients) {
        self.coeffs = coeffs;
        self.clear();
    }
}

/// Per-channel cascade: high shelf, then low-pass, then high-pass.
#[derive(Clone, Debug)]
pub struct FilterBank {
    shelf: Biquad,
    low_pass: Biquad,
    high_pass: Biquad,
}

impl FilterBank {
    pub fn new(sample_rate: u32, low_pass: u32, high_pass: u32) -> Self {
        let mut bank = Self {
            shelf: Biquad::new(Coefficients::PASS),
            low_pass: Biquad::new(Coefficients::PASS),
            high_pass: Biquad::new(Coefficients::PASS),
        };
        bank.configure(sample_rate, low_pass, high_pass);
        bank
    }

    /// Recompute every stage. History is cleared.
    pub fn configure(&mut self, sample_rate: u32, low_pass: u32, high_pass: u32) {
        debug_assert!(sample_rate >= 2 * low_pass, "low-pass above nyquist");
        debug_assert!(high_pass < low_pass, "high-pass must sit below low-pass");

        let rate = f64::from(sample_rate);
        self.shelf.set(
            Design::HighShelf { freq: SHELF_FREQ, slope: SHELF_SLOPE, gain_db: SHELF_GAIN_DB }
                .coefficients(rate),
        );
        self.low_pass
            .set(Design::LowPass { freq: f64::from(low_pass), q: Q }.coefficients(rate));
        self.high_pass
            .set(Design::HighPass { freq: f64::from(high_pass), q: Q }.coefficients(rate));
    }

    #[inline]
    pub fn process(&mut self, x: f64) -> f64 {
        self.high_pass.process(self.low_pass.process(self.shelf.process(x)))
    }

    pub fn clear(&mut self) {
        self.shelf.clear();
        self.low_pass.clear();
        self.high_pass.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const RATE: f64 = 16_000.0;

    /// Magnitude of the transfer function at z = 1 (DC) and z = -1 (nyquist).
    fn dc_and_nyquist(c: Coefficients) -> (f64, f64) {
        let dc = (c.b0 + c.b1 + c.b2) / (1.0 + c.a1 + c.a2);
        let ny = (c.b0 - c.b1 + c.b2) / (1.0 - c.a1 + c.a2);
        (dc.abs(), ny.abs())
    }

    #[test]
    fn low_pass_passes_dc_and_blocks_nyquist() {
        let (dc, ny) = dc_and_nyquist(Design::LowPass { freq: 4000.0, q: Q }.coefficients(RATE));
        assert_abs_diff_eq!(dc, 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(ny, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn high_pass_blocks_dc_and_passes_nyquist() {
        let (dc, ny) = dc_and_nyquist(Design::HighPass { freq: 40.0, q: Q }.coefficients(RATE));
        assert_abs_diff_eq!(dc, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(ny, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn high_shelf_boosts_only_the_top() {
        let design = Design::HighShelf { freq: SHELF_FREQ, slope: SHELF_SLOPE, gain_db: SHELF_GAIN_DB };
        let (dc, ny) = dc_and_nyquist(design.coefficients(RATE));
        assert_abs_diff_eq!(dc, 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(ny, 10f64.powf(SHELF_GAIN_DB / 20.0), epsilon = 1e-9);
    }

    #[test]
    fn high_pass_settles_to_zero_on_constant_input() {
        let mut bank = FilterBank::new(16_000, 4000, 40);
        let mut last = 1.0;
        for _ in 0..16_000 {
            last = bank.process(0.5);
        }
        assert!(last.abs() < 1e-3, "residual {}", last);
    }

    #[test]
    fn clear_restores_fresh_behavior() {
        let mut fresh = FilterBank::new(16_000, 4000, 40);
        let mut used = FilterBank::new(16_000, 4000, 40);
        for i in 0..100 {
            used.process((i as f64 * 0.3).sin());
        }
        used.clear();
        for i in 0..50 {
            let x = (i as f64 * 0.7).cos();
            assert_eq!(fresh.process(x), used.process(x));
        }
    }

    #[test]
    fn passthrough_is_identity() {
        let mut b = Biquad::new(Coefficients::PASS);
        assert_eq!(b.process(0.25), 0.25);
        assert_eq!(b.process(-1.0), -1.0);
    }
}
