//! Rolling per-channel sample windows shared with the audio callback.

use super::filter::FilterBank;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Map a signed 16-bit sample into [-1, 1).
#[inline]
pub fn normalize(sample: i16) -> f64 {
    if sample > 0 {
        f64::from(sample) / 32767.0
    } else {
        f64::from(sample) / 32768.0
    }
}

/// One channel: filtered samples, oldest first.
struct Lane {
    samples: Vec<f64>,
    filter: FilterBank,
}

impl Lane {
    /// Filter `count` new samples and append them, shifting out the oldest.
    fn push(&mut self, input: impl Iterator<Item = i16>, count: usize) {
        let n = self.samples.len();
        if count >= n {
            let skip = count - n;
            for (i, x) in input.enumerate() {
                let y = self.filter.process(normalize(x));
                if i >= skip {
                    self.samples[i - skip] = y;
                }
            }
            return;
        }

        self.samples.copy_within(count.., 0);
        let tail = &mut self.samples[n - count..];
        for (slot, x) in tail.iter_mut().zip(input) {
            *slot = self.filter.process(normalize(x));
        }
    }
}

struct Lanes {
    lanes: Vec<Lane>,
    sample_rate: u32,
    low_pass: u32,
    high_pass: u32,
}

/// Shared between the audio thread (writer) and the event loop (reader).
pub struct Capture {
    inner: Mutex<Lanes>,
    update: AtomicBool,
    silent: AtomicBool,
}

impl Capture {
    pub fn new(window_size: usize, channels: usize, sample_rate: u32, low_pass: u32, high_pass: u32) -> Self {
        let mut lanes = Lanes { lanes: Vec::new(), sample_rate, low_pass, high_pass };
        lanes.rebuild(window_size, channels);
        Self {
            inner: Mutex::new(lanes),
            update: AtomicBool::new(false),
            silent: AtomicBool::new(false),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Lanes> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Recompute filter coefficients for a new rate or cutoff pair.
    pub fn configure(&self, sample_rate: u32, low_pass: u32, high_pass: u32) {
        let mut inner = self.lock();
        if (inner.sample_rate, inner.low_pass, inner.high_pass) == (sample_rate, low_pass, high_pass) {
            return;
        }
        inner.sample_rate = sample_rate;
        inner.low_pass = low_pass;
        inner.high_pass = high_pass;
        for lane in &mut inner.lanes {
            lane.filter.configure(sample_rate, low_pass, high_pass);
        }
    }

    /// Change the channel count or window length. Existing samples are discarded.
    pub fn set_layout(&self, window_size: usize, channels: usize) {
        let mut inner = self.lock();
        if inner.lanes.len() == channels && inner.window_size() == window_size {
            return;
        }
        inner.rebuild(window_size, channels);
    }

    pub fn channels(&self) -> usize {
        self.lock().lanes.len()
    }

    /// Audio-thread entry point. `interleaved` holds one sample per channel per frame.
    pub fn on_samples(&self, interleaved: &[i16]) {
        if interleaved.is_empty() {
            return;
        }
        if interleaved.iter().all(|&s| s == 0) {
            self.silent.store(true, Ordering::Release);
            return;
        }

        {
            let mut inner = self.lock();
            let channels = inner.lanes.len().max(1);
            let frames = interleaved.len() / channels;
            for (c, lane) in inner.lanes.iter_mut().enumerate() {
                let input = interleaved.iter().skip(c).step_by(channels).take(frames).copied();
                lane.push(input, frames);
            }
        }

        self.silent.store(false, Ordering::Release);
        self.update.store(true, Ordering::Release);
    }

    /// Returns and clears the "new audio" flag.
    pub fn take_update(&self) -> bool {
        self.update.swap(false, Ordering::AcqRel)
    }

    pub fn is_silent(&self) -> bool {
        self.silent.load(Ordering::Acquire)
    }

    /// Copy one channel multiplied by `taper` into `out`. Returns false if the
    /// channel does not exist or the taper length does not match.
    pub fn copy_windowed(&self, channel: usize, taper: &[f64], out: &mut Vec<f32>) -> bool {
        let inner = self.lock();
        let Some(lane) = inner.lanes.get(channel) else {
            return false;
        };
        if lane.samples.len() != taper.len() {
            return false;
        }
        out.clear();
        out.extend(lane.samples.iter().zip(taper).map(|(s, w)| (s * w) as f32));
        true
    }
}

impl Lanes {
    fn window_size(&self) -> usize {
        self.lanes.first().map_or(0, |l| l.samples.len())
    }

    fn rebuild(&mut self, window_size: usize, channels: usize) {
        self.lanes = (0..channels.max(1))
            .map(|_| Lane {
                samples: vec![0.0; window_size],
                filter: FilterBank::new(self.sample_rate, self.low_pass, self.high_pass),
            })
            .collect();
    }
}
