//! Numeric helpers shared by grouping, layout and drawing.

pub mod resample;
pub mod smooth;

/// Linear map of `v` from [in_min, in_max] onto [out_min, out_max].
pub fn scale(v: f64, in_min: f64, in_max: f64, out_min: f64, out_max: f64) -> f64 {
    (v - in_min) * (out_max - out_min) / (in_max - in_min) + out_min
}

/// Exponential map with `scale_log(in_min) == out_min` and `scale_log(in_max) == out_max`.
pub fn scale_log(v: f64, in_min: f64, in_max: f64, out_min: f64, out_max: f64) -> f64 {
    let b = (out_max / out_min).ln() / (in_max - in_min);
    let a = out_max / (b * in_max).exp();
    a * (b * v).exp()
}

pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + t * (b - a)
}
