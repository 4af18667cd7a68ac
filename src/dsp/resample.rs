/// `(value, frequency)`
pub type Pair = (f64, f64);

fn gcd(mut a: usize, mut b: usize) -> usize {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Rational resampling of `(value, frequency)` pairs by `interpolate / decimate`.
///
/// Interpolation is linear between neighbours. Decimation keeps, per block,
/// the loudest pair whose frequency still rises above the previous pick, so
/// output frequencies stay ordered.
pub fn resample(input: Vec<Pair>, interpolate: usize, decimate: usize) -> Vec<Pair> {
    if interpolate == decimate || (interpolate <= 1 && decimate <= 1) || input.is_empty() {
        return input;
    }

    let g = gcd(interpolate, decimate);
    let (up, down) = (interpolate / g, decimate / g);

    let stretched = if up > 1 { stretch(&input, up) } else { input };
    if down > 1 {
        pick(&stretched, down)
    } else {
        stretched
    }
}

fn stretch(input: &[Pair], n: usize) -> Vec<Pair> {
    let mut out = Vec::with_capacity(input.len() * n);
    for w in input.windows(2) {
        let (value, freq) = w[0];
        let (next_value, next_freq) = w[1];
        let dv = (next_value - value) / n as f64;
        let df = (next_freq - freq) / n as f64;
        for j in 0..n {
            out.push((value + dv * j as f64, freq + df * j as f64));
        }
    }
    // The tail repeats the last interpolated pair, not the last source pair.
    if let Some(&last) = out.last().or(input.last()) {
        out.extend(std::iter::repeat(last).take(n));
    }
    out
}

fn pick(input: &[Pair], n: usize) -> Vec<Pair> {
    let mut out = Vec::with_capacity(input.len() / n);
    let mut block: Vec<Pair> = Vec::with_capacity(n);
    let mut prev_freq = 0.0;

    for chunk in input.chunks_exact(n) {
        block.clear();
        block.extend_from_slice(chunk);
        block.sort_by(|a, b| b.0.total_cmp(&a.0));
        block.dedup();

        let chosen = block
            .iter()
            .copied()
            .find(|&(_, f)| f > prev_freq)
            .or_else(|| block.last().copied());
        if let Some(p) = chosen {
            prev_freq = p.1;
            out.push(p);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize) -> Vec<Pair> {
        (0..n).map(|i| (-(i as f64) * 3.0 % 17.0, 100.0 + i as f64 * 10.0)).collect()
    }

    #[test]
    fn equal_factors_are_identity() {
        let x = ramp(9);
        assert_eq!(resample(x.clone(), 9, 9), x);
        assert_eq!(resample(x.clone(), 1, 1), x);
        assert_eq!(resample(x.clone(), 0, 1), x);
    }

    #[test]
    fn output_length_matches_target() {
        for len in 1..60 {
            for k in [1, 2, 7, 16, 33, 80] {
                let out = resample(ramp(len), k, len);
                assert_eq!(out.len(), k, "len {} -> {}", len, k);
            }
        }
    }

    #[test]
    fn interpolation_fills_between_neighbours() {
        let out = resample(vec![(0.0, 100.0), (10.0, 200.0)], 2, 1);
        assert_eq!(out, vec![(0.0, 100.0), (5.0, 150.0), (5.0, 150.0), (5.0, 150.0)]);
    }

    #[test]
    fn single_pair_is_repeated() {
        let out = resample(vec![(-7.0, 440.0)], 3, 1);
        assert_eq!(out, vec![(-7.0, 440.0); 3]);
    }

    #[test]
    fn decimation_picks_loudest_with_rising_frequency() {
        let input = vec![(-10.0, 100.0), (-5.0, 200.0), (-1.0, 150.0), (-30.0, 300.0)];
        let out = resample(input, 1, 2);
        assert_eq!(out, vec![(-5.0, 200.0), (-30.0, 300.0)]);
    }

    #[test]
    fn decimated_frequencies_never_fall() {
        let out = resample(ramp(57), 8, 57);
        assert!(out.windows(2).all(|w| w[1].1 >= w[0].1), "{:?}", out);
    }
}
