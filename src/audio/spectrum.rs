//! dB magnitude spectra computed from the capture windows once per tick.

use super::capture::Capture;
use spectrum_analyzer::{samples_fft_to_spectrum, FrequencyLimit};
use std::f64::consts::PI;

/// Coherent gain of the Hann window
pub const HANN_GAIN: f64 = 0.5;

/// Inputs that shape a spectrum, taken from the config snapshot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpectrumParams {
    pub sample_rate: u32,
    pub low_pass: u32,
    pub high_pass: u32,
    pub trim: bool,
    /// Value emitted for every bin while the input is silent
    pub floor: f64,
    pub channels: usize,
}

impl SpectrumParams {
    pub fn bin_width(&self, window_size: usize) -> f64 {
        f64::from(self.sample_rate) / window_size as f64
    }

    /// Bin range kept after trimming, as `[start, end)` into the half spectrum.
    pub fn kept_bins(&self, window_size: usize) -> (usize, usize) {
        let half = window_size / 2;
        if !self.trim {
            return (0, half);
        }
        let bin = self.bin_width(window_size);
        let end = ((f64::from(self.low_pass) / bin) as usize).min(half);
        let start = ((f64::from(self.high_pass) / bin) as usize).min(end);
        (start, end)
    }

    /// Frequency of the first kept bin, used to label bars.
    pub fn base_frequency(&self) -> f64 {
        if self.trim {
            f64::from(self.high_pass)
        } else {
            0.0
        }
    }
}

/// Symmetric Hann taper of length `n`.
pub fn hann(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f64 / n as f64).cos()))
        .collect()
}

pub struct Analyzer {
    window_size: usize,
    taper: Vec<f64>,
    windowed: Vec<f32>,
    spectra: [Vec<f64>; 2],
    /// Floor and trimmed length last written while silent
    silent_floor: Option<(f64, usize)>,
}

impl Analyzer {
    pub fn new(window_size: usize) -> Self {
        Self {
            window_size,
            taper: hann(window_size),
            windowed: Vec::with_capacity(window_size),
            spectra: [Vec::new(), Vec::new()],
            silent_floor: None,
        }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn resize(&mut self, window_size: usize) {
        if window_size != self.window_size {
            *self = Self::new(window_size);
        }
    }

    pub fn spectrum(&self, channel: usize) -> &[f64] {
        match self.spectra.get(channel) {
            Some(s) => s,
            None => &[],
        }
    }

    /// Recompute spectra if new audio arrived. Returns true when any spectrum changed.
    pub fn refresh(&mut self, capture: &Capture, params: &SpectrumParams) -> bool {
        if capture.is_silent() {
            let (start, end) = params.kept_bins(self.window_size);
            let floor = Some((params.floor, end - start));
            if self.silent_floor == floor {
                return false;
            }
            for spectrum in &mut self.spectra {
                spectrum.clear();
                spectrum.resize(end - start, params.floor);
            }
            self.silent_floor = floor;
            return true;
        }

        if !capture.take_update() {
            return false;
        }
        self.silent_floor = None;

        let mut changed = false;
        for channel in 0..params.channels.min(self.spectra.len()) {
            if capture.copy_windowed(channel, &self.taper, &mut self.windowed) {
                changed |= self.transform(channel, params);
            }
        }
        changed
    }

    fn transform(&mut self, channel: usize, params: &SpectrumParams) -> bool {
        let spectrum = match samples_fft_to_spectrum(
            &self.windowed,
            params.sample_rate,
            FrequencyLimit::All,
            None,
        ) {
            Ok(s) => s,
            Err(e) => {
                log::warn!("fft failed on channel {}: {:?}", channel, e);
                return false;
            }
        };

        let half = self.window_size / 2;
        let norm = half as f64 / HANN_GAIN;
        let out = &mut self.spectra[channel];
        out.clear();
        out.extend(
            spectrum
                .data()
                .iter()
                .take(half)
                .map(|(_, magnitude)| 20.0 * (f64::from(magnitude.val()) / norm).log10()),
        );

        let (start, end) = params.kept_bins(self.window_size);
        out.truncate(end);
        out.drain(..start.min(out.len()));
        true
    }
}
