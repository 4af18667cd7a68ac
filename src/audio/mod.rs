//! Audio capture.
//!
//! The recording device is opened through cpal. On PulseAudio/PipeWire systems
//! the monitor of the default sink is selected for the lifetime of the source,
//! so the visualizer follows system playback rather than a microphone.
//! Device samples are converted to i16 and remapped into the configured
//! channel layout before reaching [`Capture::on_samples`].

pub mod capture;
pub mod filter;
pub mod spectrum;

use crate::error::{Error, Result};
use capture::Capture;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SampleFormat, SizedSample};
use std::fs::File;
use std::os::unix::io::AsRawFd;
use std::process::Command;
use std::sync::Arc;

/// Redirects stderr to /dev/null while alive. ALSA prints enumeration noise
/// that would otherwise land on the terminal.
struct StderrSuppressor {
    saved_fd: i32,
    _dev_null: File,
}

impl StderrSuppressor {
    fn new() -> Option<Self> {
        let dev_null = File::open("/dev/null").ok()?;

        let saved_fd = unsafe { libc::dup(2) };
        if saved_fd < 0 {
            return None;
        }
        if unsafe { libc::dup2(dev_null.as_raw_fd(), 2) } < 0 {
            unsafe { libc::close(saved_fd) };
            return None;
        }

        Some(Self { saved_fd, _dev_null: dev_null })
    }
}

impl Drop for StderrSuppressor {
    fn drop(&mut self) {
        unsafe {
            libc::dup2(self.saved_fd, 2);
            libc::close(self.saved_fd);
        }
    }
}

/// PulseAudio source names: alphanumerics plus `.-_:@`
fn is_valid_source_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | ':' | '@'))
}

fn pactl(args: &[&str]) -> Option<String> {
    Command::new("pactl")
        .args(args)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
}

/// Makes a sink monitor the default source; restores the previous default on drop.
struct MonitorSource {
    original: Option<String>,
    selected: Option<String>,
}

impl MonitorSource {
    fn select() -> Self {
        let original = pactl(&["get-default-source"]).filter(|s| is_valid_source_name(s));
        let sink = pactl(&["get-default-sink"]).filter(|s| is_valid_source_name(s));

        let sources: Vec<String> = pactl(&["list", "sources", "short"])
            .map(|out| {
                out.lines()
                    .filter_map(|line| line.split('\t').nth(1))
                    .filter(|name| is_valid_source_name(name))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let preferred = sink.map(|s| format!("{}.monitor", s));
        let selected = sources
            .iter()
            .find(|name| Some(name.as_str()) == preferred.as_deref())
            .or_else(|| sources.iter().find(|name| name.contains(".monitor")))
            .cloned();

        if let Some(name) = &selected {
            let _ = pactl(&["set-default-source", name]);
        }
        log::info!("monitor source: original={:?} selected={:?}", original, selected);

        Self { original, selected }
    }
}

impl Drop for MonitorSource {
    fn drop(&mut self) {
        if let (Some(original), Some(_)) = (&self.original, &self.selected) {
            let _ = pactl(&["set-default-source", original]);
        }
    }
}

/// Convert frames of `device_channels` samples into `layout` channels
/// (1 = average of the first two, 2 = first two as left/right).
fn remap(input: impl Iterator<Item = i16>, device_channels: usize, layout: usize, out: &mut Vec<i16>) {
    out.clear();
    let mut frame = [0i16; 2];
    let mut pos = 0;
    for sample in input {
        if pos < 2 {
            frame[pos] = sample;
        }
        pos += 1;
        if pos == device_channels {
            let left = frame[0];
            let right = if device_channels > 1 { frame[1] } else { left };
            if layout == 1 {
                out.push(((i32::from(left) + i32::from(right)) / 2) as i16);
            } else {
                out.push(left);
                out.push(right);
            }
            pos = 0;
        }
    }
}

/// Prefer a config that supports `rate` directly, falling back to the device default.
fn pick_config(device: &cpal::Device, rate: u32) -> Result<cpal::SupportedStreamConfig> {
    let wanted = cpal::SampleRate(rate);
    if let Ok(ranges) = device.supported_input_configs() {
        let mut candidates: Vec<_> = ranges
            .filter(|r| r.min_sample_rate() <= wanted && wanted <= r.max_sample_rate())
            .filter(|r| {
                matches!(r.sample_format(), SampleFormat::I16 | SampleFormat::F32 | SampleFormat::U16)
            })
            .collect();
        candidates.sort_by_key(|r| (r.sample_format() != SampleFormat::I16, r.channels() < 2));
        if let Some(range) = candidates.into_iter().next() {
            return Ok(range.with_sample_rate(wanted));
        }
    }
    Ok(device.default_input_config()?)
}

pub struct AudioSource {
    device: cpal::Device,
    capture: Arc<Capture>,
    stream: Option<cpal::Stream>,
    channels: usize,
    requested_rate: u32,
    sample_rate: u32,
    _monitor: MonitorSource,
}

impl AudioSource {
    /// Whether a default recording device exists.
    pub fn available() -> bool {
        let _quiet = StderrSuppressor::new();
        cpal::default_host().default_input_device().is_some()
    }

    pub fn open(capture: Arc<Capture>, channels: usize, sample_rate: u32) -> Result<Self> {
        let _quiet = StderrSuppressor::new();

        let host = cpal::default_host();
        log::info!("audio host: {:?}", host.id());

        let monitor = MonitorSource::select();
        let device = host.default_input_device().ok_or(Error::DeviceUnavailable)?;
        log::info!("input device: {}", device.name().unwrap_or_else(|_| "unknown".into()));

        Ok(Self {
            device,
            capture,
            stream: None,
            channels: channels.clamp(1, 2),
            requested_rate: sample_rate,
            sample_rate,
            _monitor: monitor,
        })
    }

    pub fn recording(&self) -> bool {
        self.stream.is_some()
    }

    /// Effective rate of the running (or last started) stream.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn set_channels(&mut self, channels: usize) -> Result<()> {
        let channels = channels.clamp(1, 2);
        if channels == self.channels {
            return Ok(());
        }
        self.channels = channels;
        self.restart()
    }

    pub fn set_sample_rate(&mut self, rate: u32) -> Result<()> {
        if rate == self.requested_rate {
            return Ok(());
        }
        self.requested_rate = rate;
        self.restart()
    }

    fn restart(&mut self) -> Result<()> {
        if self.recording() {
            self.stop();
            self.start()?;
        }
        Ok(())
    }

    pub fn start(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }
        let _quiet = StderrSuppressor::new();

        let supported = pick_config(&self.device, self.requested_rate)?;
        let format = supported.sample_format();
        let config: cpal::StreamConfig = supported.config();
        let device_channels = usize::from(config.channels);
        if device_channels == 0 {
            return Err(Error::DeviceUnavailable);
        }
        log::info!(
            "stream config: {} Hz, {} device channels, {:?}, layout {}",
            config.sample_rate.0,
            device_channels,
            format,
            self.channels
        );

        let stream = match format {
            SampleFormat::I16 => self.input_stream::<i16>(&config, device_channels)?,
            SampleFormat::F32 => self.input_stream::<f32>(&config, device_channels)?,
            SampleFormat::U16 => self.input_stream::<u16>(&config, device_channels)?,
            other => return Err(Error::UnsupportedFormat(other)),
        };
        stream.play()?;

        self.sample_rate = config.sample_rate.0;
        self.stream = Some(stream);
        Ok(())
    }

    fn input_stream<T>(&self, config: &cpal::StreamConfig, device_channels: usize) -> Result<cpal::Stream>
    where
        T: SizedSample,
        i16: FromSample<T>,
    {
        let capture = Arc::clone(&self.capture);
        let layout = self.channels;
        let mut block: Vec<i16> = Vec::new();

        let stream = self.device.build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                remap(data.iter().map(|&s| s.to_sample::<i16>()), device_channels, layout, &mut block);
                capture.on_samples(&block);
            },
            |err| log::error!("audio stream error: {}", err),
            None,
        )?;
        Ok(stream)
    }

    pub fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.pause();
            log::debug!("audio stream stopped");
        }
    }
}

impl Drop for AudioSource {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(input: &[i16], device_channels: usize, layout: usize) -> Vec<i16> {
        let mut out = Vec::new();
        remap(input.iter().copied(), device_channels, layout, &mut out);
        out
    }

    #[test]
    fn stereo_device_to_mono_averages() {
        assert_eq!(run(&[100, 300, -50, 50], 2, 1), vec![200, 0]);
    }

    #[test]
    fn mono_device_to_stereo_duplicates() {
        assert_eq!(run(&[7, 9], 1, 2), vec![7, 7, 9, 9]);
    }

    #[test]
    fn surround_device_keeps_front_pair() {
        let frame = [1, 2, 3, 4, 5, 6];
        assert_eq!(run(&frame, 6, 2), vec![1, 2]);
    }

    #[test]
    fn partial_trailing_frame_is_dropped() {
        assert_eq!(run(&[1, 2, 3], 2, 2), vec![1, 2]);
    }

    #[test]
    fn source_names_are_filtered() {
        assert!(is_valid_source_name("alsa_output.pci-0000_03_00.1.hdmi-stereo.monitor"));
        assert!(is_valid_source_name("@DEFAULT_SINK@"));
        assert!(!is_valid_source_name("foo; rm -rf /"));
        assert!(!is_valid_source_name(""));
    }
}
