use crate::colors::{Palette, Rgba};
use crate::config::{BarSize, Config, Grouping, Orientation, Smoothing, StereoLayout};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Bar size as written in the config file: an integer is cells, a float a fraction.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SizeSetting {
    Fixed(usize),
    Dynamic(f64),
}

impl From<SizeSetting> for BarSize {
    fn from(s: SizeSetting) -> Self {
        match s {
            SizeSetting::Fixed(n) => BarSize::Fixed(n),
            SizeSetting::Dynamic(f) => BarSize::Dynamic(f),
        }
    }
}

/// Parse `--bar-width`/`--bar-height`: `3` is cells, `0.25` a fraction.
pub fn parse_bar_size(s: &str) -> Result<BarSize, String> {
    if s.contains('.') {
        s.parse::<f64>().map(BarSize::Dynamic).map_err(|e| e.to_string())
    } else {
        s.parse::<usize>().map(BarSize::Fixed).map_err(|e| e.to_string())
    }
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ColorSettings {
    pub background: Option<String>,
    /// Two or four hex stops
    pub gradient: Option<Vec<String>>,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MotionSettings {
    pub freq_unique: Option<bool>,
    pub freq_up: Option<f64>,
    pub freq_down: Option<f64>,
    pub peak_unique: Option<bool>,
    pub peak_down: Option<f64>,
}

/// One layer of overrides. Unset fields leave the underlying value alone.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub fps: Option<u32>,
    pub window_size: Option<usize>,
    pub sample_rate: Option<u32>,
    pub low_pass: Option<u32>,
    pub high_pass: Option<u32>,
    pub trim: Option<bool>,
    pub threshold_min: Option<f64>,
    pub threshold_max: Option<f64>,

    pub grouping: Option<Grouping>,
    pub octave_scale: Option<u32>,
    pub smoothing: Option<Smoothing>,
    pub smoothing_width: Option<usize>,
    pub smoothing_threshold: Option<f64>,

    pub mono: Option<bool>,
    pub channel_swap: Option<bool>,
    pub layout: Option<StereoLayout>,
    pub orientation: Option<Orientation>,
    pub flip: Option<bool>,
    pub reverse: Option<bool>,

    pub bar_width: Option<SizeSetting>,
    pub bar_height: Option<SizeSetting>,
    pub full_height: Option<bool>,
    pub linear_height: Option<bool>,
    pub padding: Option<usize>,

    pub draw_freq: Option<bool>,
    pub draw_freq_always: Option<bool>,
    pub draw_peak: Option<bool>,
    pub draw_peak_always: Option<bool>,
    pub peak_reverse: Option<bool>,

    pub color: Option<bool>,
    pub alpha: Option<bool>,
    pub alpha_blend: Option<f64>,
    pub gradient_x: Option<bool>,
    pub gradient_y: Option<bool>,
    pub color_swap: Option<bool>,
    pub color_shift: Option<bool>,
    pub color_shift_ms: Option<u64>,
    pub overlay: Option<bool>,

    pub colors: ColorSettings,
    pub motion: MotionSettings,
}

fn set<T>(target: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *target = v;
    }
}

fn hex(what: &str, s: &str) -> Option<Rgba> {
    let color = Rgba::from_hex(s);
    if color.is_none() {
        log::warn!("ignoring {} color {:?}: expected 6 or 8 hex digits", what, s);
    }
    color
}

impl Settings {
    /// Read the config file, falling back to no overrides on any problem.
    pub fn load(path: Option<&Path>) -> Self {
        let path = path.map_or_else(Self::config_path, Path::to_path_buf);
        if !path.exists() {
            log::debug!("no config file at {}", path.display());
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content).unwrap_or_else(|e| {
                log::warn!("ignoring {}: {}", path.display(), e);
                Self::default()
            }),
            Err(e) => {
                log::warn!("cannot read {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("termscope")
            .join("config.toml")
    }

    /// Layer these overrides onto `cfg` and sanitize the result.
    pub fn apply(&self, mut cfg: Config) -> Config {
        set(&mut cfg.fps, self.fps);
        set(&mut cfg.window_size, self.window_size);
        set(&mut cfg.sample_rate, self.sample_rate);
        set(&mut cfg.low_pass, self.low_pass);
        set(&mut cfg.high_pass, self.high_pass);
        set(&mut cfg.trim, self.trim);
        set(&mut cfg.threshold_min, self.threshold_min);
        set(&mut cfg.threshold_max, self.threshold_max);

        set(&mut cfg.grouping, self.grouping);
        set(&mut cfg.octave_scale, self.octave_scale);
        set(&mut cfg.smoothing, self.smoothing);
        set(&mut cfg.smoothing_width, self.smoothing_width);
        set(&mut cfg.smoothing_threshold, self.smoothing_threshold);

        set(&mut cfg.mono, self.mono);
        set(&mut cfg.channel_swap, self.channel_swap);
        set(&mut cfg.layout, self.layout);
        set(&mut cfg.orientation, self.orientation);
        set(&mut cfg.flip, self.flip);
        set(&mut cfg.reverse, self.reverse);

        set(&mut cfg.bar_width, self.bar_width.map(BarSize::from));
        set(&mut cfg.bar_height, self.bar_height.map(BarSize::from));
        set(&mut cfg.full_height, self.full_height);
        set(&mut cfg.linear_height, self.linear_height);
        set(&mut cfg.padding, self.padding);

        set(&mut cfg.draw_freq, self.draw_freq);
        set(&mut cfg.draw_freq_always, self.draw_freq_always);
        set(&mut cfg.draw_peak, self.draw_peak);
        set(&mut cfg.draw_peak_always, self.draw_peak_always);
        set(&mut cfg.peak_reverse, self.peak_reverse);

        set(&mut cfg.color, self.color);
        set(&mut cfg.alpha, self.alpha);
        set(&mut cfg.alpha_blend, self.alpha_blend);
        set(&mut cfg.gradient_x, self.gradient_x);
        set(&mut cfg.gradient_y, self.gradient_y);
        set(&mut cfg.color_swap, self.color_swap);
        set(&mut cfg.color_shift, self.color_shift);
        set(&mut cfg.color_shift_ms, self.color_shift_ms);
        set(&mut cfg.overlay, self.overlay);

        let m = &self.motion;
        set(&mut cfg.motion.freq_unique, m.freq_unique);
        set(&mut cfg.motion.freq_up, m.freq_up);
        set(&mut cfg.motion.freq_down, m.freq_down);
        set(&mut cfg.motion.peak_unique, m.peak_unique);
        set(&mut cfg.motion.peak_down, m.peak_down);

        cfg.palette = self.palette(cfg.palette);
        cfg.sanitize()
    }

    fn palette(&self, base: Palette) -> Palette {
        let mut palette = base;
        if let Some(bg) = self.colors.background.as_deref().and_then(|s| hex("background", s)) {
            palette.background = bg;
        }
        if let Some(stops) = &self.colors.gradient {
            let parsed: Option<Vec<Rgba>> = stops.iter().map(|s| hex("gradient", s)).collect();
            match parsed.and_then(|stops| Palette::from_stops(palette.background, &stops)) {
                Some(p) => palette = p,
                None => log::warn!("ignoring gradient: expected 2 or 4 valid colors"),
            }
        }
        palette
    }
}
