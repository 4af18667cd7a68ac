use std::collections::VecDeque;

/// Savitzky-Golay style smoothing over `bars`, in place.
///
/// Each interior value is replaced by the windowed accumulator
/// `sum((v / width) + j - part)` over the `width` neighbours centered on it.
/// With a nonzero `threshold`, a value is only replaced when it already lies
/// within `threshold` of the result. The `part` values at each end are left
/// alone, as is everything when `width` is even, below 3 or wider than `bars`.
pub fn savitzky_golay(bars: &mut [f64], width: usize, threshold: f64) {
    if width < 3 || width % 2 == 0 || width > bars.len() {
        return;
    }

    let part = (width - 1) / 2;
    let c = 1.0 / width as f64;

    // Holds original values, so results do not feed into later windows.
    let mut ring: VecDeque<f64> = bars[..width - 1].iter().copied().collect();

    for i in part..bars.len() - part {
        ring.push_back(bars[i + part]);

        let mut res = 0.0;
        for (j, &v) in ring.iter().enumerate() {
            res += v * c + j as f64 - part as f64;
        }

        if threshold == 0.0 || (bars[i] - res).abs() < threshold {
            bars[i] = res;
        }
        ring.pop_front();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn three_point_window_matches_accumulator_exactly() {
        let mut bars = [-60.0, -20.0, -60.0];
        savitzky_golay(&mut bars, 3, 0.0);

        let c = 1.0 / 3.0;
        let mut expected: f64 = 0.0;
        expected += -60.0 * c + 0.0 - 1.0;
        expected += -20.0 * c + 1.0 - 1.0;
        expected += -60.0 * c + 2.0 - 1.0;

        assert_eq!(bars[1].to_bits(), expected.to_bits());
        assert_abs_diff_eq!(bars[1], -140.0 / 3.0, epsilon = 1e-9);
        assert_eq!(bars[0], -60.0);
        assert_eq!(bars[2], -60.0);
    }

    #[test]
    fn uses_original_neighbours_not_smoothed_ones() {
        let mut bars = [0.0, 30.0, 0.0, 30.0, 0.0];
        savitzky_golay(&mut bars, 3, 0.0);
        assert_abs_diff_eq!(bars[1], 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(bars[2], 20.0, epsilon = 1e-9);
        assert_abs_diff_eq!(bars[3], 10.0, epsilon = 1e-9);
    }

    #[test]
    fn gate_leaves_outliers() {
        let mut bars = [-60.0, -60.0, -20.0, -60.0, -60.0];
        savitzky_golay(&mut bars, 3, 4.0);
        // The spike is far from its neighbourhood mean; everything else is
        // too far from the spike-inflated means as well.
        assert_eq!(bars, [-60.0, -60.0, -20.0, -60.0, -60.0]);

        let mut flat = [-40.0, -41.0, -40.0, -39.0, -40.0];
        savitzky_golay(&mut flat, 3, 4.0);
        assert_abs_diff_eq!(flat[2], -40.0, epsilon = 1e-9);
    }

    #[test]
    fn degenerate_widths_are_noops() {
        let original = [1.0, 5.0, 2.0, 8.0];
        for width in [0, 1, 2, 4, 5, 9] {
            let mut bars = original;
            savitzky_golay(&mut bars, width, 0.0);
            assert_eq!(bars, original, "width {}", width);
        }
    }
}
