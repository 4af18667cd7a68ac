//! Reduce a dB spectrum to a fixed number of bar values.

use crate::dsp::resample::{resample, Pair};
use crate::dsp::scale_log;
use std::ops::Range;

/// Reference pitch (A4)
const A4: f64 = 440.0;

/// How spectrum indices map to frequencies.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bins {
    pub width: f64,
    /// Frequency of index 0
    pub base: f64,
}

impl Bins {
    pub fn frequency(&self, index: usize) -> f64 {
        index as f64 * self.width + self.base
    }
}

/// Musical note nearest to a frequency, on a 12 or 24 step octave.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Note {
    scale: u32,
    tone: u32,
    octave: i32,
}

const SEMITONES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];
const QUARTER_TONES: [&str; 24] = [
    "C", "C+", "C#", "C#+", "D", "D+", "D#", "D#+", "E", "E+", "F", "F+", "F#", "F#+", "G", "G+", "G#",
    "G#+", "A", "A+", "A#", "A#+", "B", "B+",
];

impl Note {
    /// Steps above C0.
    pub fn index(freq: f64, scale: u32) -> i64 {
        let steps = f64::from(scale) * (freq / A4).log2();
        steps.round() as i64 + 57 * i64::from(scale / 12)
    }

    pub fn new(freq: f64, scale: u32) -> Self {
        let scale = if scale == 12 { 12 } else { 24 };
        let index = Self::index(freq, scale);
        let s = i64::from(scale);
        Self {
            scale,
            tone: index.rem_euclid(s) as u32,
            octave: index.div_euclid(s) as i32,
        }
    }

    pub fn name(&self) -> &'static str {
        if self.scale == 12 {
            SEMITONES[self.tone as usize]
        } else {
            QUARTER_TONES[self.tone as usize]
        }
    }
}

impl std::fmt::Display for Note {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.name(), self.octave)
    }
}

/// `count` contiguous, non-empty ranges covering `[0, bins)`, widening
/// exponentially toward the top. Requires `1 <= count <= bins`.
pub fn log_ranges(count: usize, bins: usize) -> Vec<Range<usize>> {
    if count == 0 || bins == 0 {
        return Vec::new();
    }
    if count == 1 {
        return vec![0..bins];
    }

    let mut ranges = Vec::with_capacity(count);
    let mut start = 0;
    for x in 0..count {
        let end = if x == count - 1 {
            bins
        } else {
            let e = scale_log((x + 1) as f64, 1.0, count as f64, 1.0, bins as f64).round() as usize;
            // Leave at least one bin for each bar still to come.
            e.max(start + 1).min(bins - (count - 1 - x))
        };
        ranges.push(start..end);
        start = end;
    }
    ranges
}

/// Clamp into `[min, max]`. NaN and negative infinity go to `min`.
pub fn clamp_db(v: f64, min: f64, max: f64) -> f64 {
    if v.is_nan() || v < min {
        min
    } else if v > max {
        max
    } else {
        v
    }
}

/// Loudest value in `spectrum[range]` and the index it first occurs at.
fn loudest(spectrum: &[f64], range: Range<usize>) -> (f64, usize) {
    let start = range.start;
    spectrum[range]
        .iter()
        .enumerate()
        .fold((f64::NEG_INFINITY, start), |(best, at), (i, &v)| {
            if v > best {
                (v, start + i)
            } else {
                (best, at)
            }
        })
}

/// Log-scale grouping into `raw`/`freq` (both of the bar count's length).
pub fn group_log(spectrum: &[f64], bins: Bins, min: f64, max: f64, raw: &mut [f64], freq: &mut [f64]) {
    let count = raw.len();
    if spectrum.len() < count {
        // Fewer bins than bars: stretch the spectrum up through the resampler.
        return group_pairs(per_bin(spectrum, bins), min, max, raw, freq);
    }

    for (x, range) in log_ranges(count, spectrum.len()).into_iter().enumerate() {
        let (value, at) = loudest(spectrum, range);
        raw[x] = clamp_db(value, min, max);
        freq[x] = bins.frequency(at);
    }
}

/// Musical-note grouping, resampled to the bar count.
pub fn group_note(
    spectrum: &[f64],
    bins: Bins,
    scale: u32,
    min: f64,
    max: f64,
    raw: &mut [f64],
    freq: &mut [f64],
) {
    let mut notes: Vec<Pair> = Vec::new();
    let mut p = 0;
    while p < spectrum.len() {
        let note = Note::index(bins.frequency(p), scale);
        let mut i = p + 1;
        while i < spectrum.len() && Note::index(bins.frequency(i), scale) == note {
            i += 1;
        }
        let (value, at) = loudest(spectrum, p..i);
        notes.push((clamp_db(value, min, max), bins.frequency(at)));
        p = i;
    }
    group_pairs(notes, min, max, raw, freq);
}

fn per_bin(spectrum: &[f64], bins: Bins) -> Vec<Pair> {
    spectrum.iter().enumerate().map(|(i, &v)| (v, bins.frequency(i))).collect()
}

fn group_pairs(pairs: Vec<Pair>, min: f64, max: f64, raw: &mut [f64], freq: &mut [f64]) {
    let count = raw.len();
    let len = pairs.len();
    let mut out = resample(pairs, count, len);
    out.resize(count, (min, 0.0));
    for (x, (value, f)) in out.into_iter().enumerate() {
        raw[x] = clamp_db(value, min, max);
        freq[x] = f;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BINS: Bins = Bins { width: 7.8125, base: 40.0 };

    #[test]
    fn log_ranges_cover_every_bin() {
        for bins in 1..80 {
            for count in 1..=bins {
                let ranges = log_ranges(count, bins);
                assert_eq!(ranges.len(), count);
                assert_eq!(ranges[0].start, 0);
                assert_eq!(ranges[count - 1].end, bins);
                for w in ranges.windows(2) {
                    assert_eq!(w[0].end, w[1].start);
                }
                assert!(ranges.iter().all(|r| r.start < r.end), "{} into {}", bins, count);
            }
        }
    }

    #[test]
    fn hot_bins_light_only_their_bars() {
        let spectrum = [-80.0, -80.0, -80.0, -80.0, -10.0, -10.0, -80.0, -80.0, -80.0, -80.0];
        let mut raw = [0.0; 8];
        let mut freq = [0.0; 8];
        group_log(&spectrum, BINS, -60.0, -20.0, &mut raw, &mut freq);

        let ranges = log_ranges(8, spectrum.len());
        for (x, range) in ranges.iter().enumerate() {
            let hot = range.contains(&4) || range.contains(&5);
            assert_eq!(raw[x] > -60.0, hot, "bar {} over {:?}", x, range);
            if hot {
                assert_eq!(raw[x], -20.0);
            } else {
                assert_eq!(raw[x], -60.0);
            }
        }
        assert_eq!(freq[4], BINS.frequency(4));
    }

    #[test]
    fn values_are_clamped() {
        let spectrum = [f64::NEG_INFINITY, f64::NAN, f64::INFINITY, -30.0];
        let mut raw = [0.0; 4];
        let mut freq = [0.0; 4];
        group_log(&spectrum, BINS, -60.0, -20.0, &mut raw, &mut freq);
        assert_eq!(raw, [-60.0, -60.0, -20.0, -30.0]);
    }

    #[test]
    fn empty_spectrum_floors_every_bar() {
        let mut raw = [1.0; 5];
        let mut freq = [1.0; 5];
        group_log(&[], BINS, -60.0, -20.0, &mut raw, &mut freq);
        assert!(raw.iter().all(|&v| v == -60.0));
        group_note(&[], BINS, 24, -60.0, -20.0, &mut raw, &mut freq);
        assert!(raw.iter().all(|&v| v == -60.0));
    }

    #[test]
    fn short_spectrum_is_stretched_to_bar_count() {
        let mut raw = [0.0; 6];
        let mut freq = [0.0; 6];
        group_log(&[-30.0, -50.0], BINS, -60.0, -20.0, &mut raw, &mut freq);
        assert_eq!(raw[0], -30.0);
        assert!(raw.iter().all(|&v| (-60.0..=-20.0).contains(&v)));
    }

    #[test]
    fn note_grouping_yields_bar_count() {
        let spectrum: Vec<f64> = (0..500).map(|i| -70.0 + (i % 40) as f64).collect();
        for count in [1, 10, 64, 200] {
            let mut raw = vec![0.0; count];
            let mut freq = vec![0.0; count];
            group_note(&spectrum, BINS, 12, -60.0, -20.0, &mut raw, &mut freq);
            assert!(raw.iter().all(|&v| (-60.0..=-20.0).contains(&v)));
            assert!(freq.iter().all(|&f| f >= BINS.base));
        }
    }

    #[test]
    fn note_names() {
        assert_eq!(Note::new(440.0, 12).to_string(), "A4");
        assert_eq!(Note::new(261.63, 12).to_string(), "C4");
        assert_eq!(Note::new(440.0, 24).to_string(), "A4");
        assert_eq!(Note::index(880.0, 12) - Note::index(440.0, 12), 12);
    }
}
