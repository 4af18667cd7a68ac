mod app;
mod audio;
mod colors;
mod config;
mod dsp;
mod error;
mod help;
mod keys;
mod logging;
mod scheduler;
mod screen;
mod settings;
mod signals;
mod terminal;
mod viz;

use app::{App, Output};
use audio::AudioSource;
use clap::Parser;
use config::{BarSize, Config, Grouping, Orientation, Smoothing, StereoLayout};
use error::Error;
use settings::{parse_bar_size, ColorSettings, MotionSettings, Settings, SizeSetting};
use std::path::PathBuf;
use terminal::{RawSink, Terminal};

/// Parse `COLSxROWS`.
fn parse_dimensions(s: &str) -> Result<(usize, usize), String> {
    let (cols, rows) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected COLSxROWS, got {:?}", s))?;
    let cols: usize = cols.trim().parse().map_err(|e| format!("columns: {}", e))?;
    let rows: usize = rows.trim().parse().map_err(|e| format!("rows: {}", e))?;
    if cols == 0 || rows == 0 {
        return Err("dimensions must be non-zero".into());
    }
    Ok((cols, rows))
}

fn size_setting(size: BarSize) -> SizeSetting {
    match size {
        BarSize::Fixed(n) => SizeSetting::Fixed(n),
        BarSize::Dynamic(f) => SizeSetting::Dynamic(f),
    }
}

#[derive(Parser, Debug)]
#[command(name = "termscope", version, about = "Audio spectrum visualizer for the terminal", long_about = None)]
struct Cli {
    /// Frames per second (10-60)
    #[arg(long)]
    fps: Option<u32>,

    /// FFT window size, rounded up to a power of two (256-8192)
    #[arg(short = 'n', long = "size")]
    window_size: Option<usize>,

    /// Requested capture rate in Hz
    #[arg(short = 'r', long)]
    sample_rate: Option<u32>,

    /// Low-pass cutoff in Hz
    #[arg(long)]
    low_pass: Option<u32>,

    /// High-pass cutoff in Hz
    #[arg(long)]
    high_pass: Option<u32>,

    /// Bars below this level are empty (dB)
    #[arg(long, allow_hyphen_values = true)]
    threshold_min: Option<f64>,

    /// Bars at this level are full (dB)
    #[arg(long, allow_hyphen_values = true)]
    threshold_max: Option<f64>,

    /// Bar grouping
    #[arg(short, long, value_enum)]
    grouping: Option<Grouping>,

    /// Notes per octave for note grouping (12 or 24)
    #[arg(long)]
    octave_scale: Option<u32>,

    /// Smoothing across neighbouring bars
    #[arg(short, long, value_enum)]
    smoothing: Option<Smoothing>,

    /// Smoothing kernel width (odd, 3-15)
    #[arg(long)]
    smoothing_width: Option<usize>,

    /// Gate for gated smoothing, as a fraction of the dB range
    #[arg(long)]
    smoothing_threshold: Option<f64>,

    /// Bar width: cells (3) or a fraction of the region (0.05)
    #[arg(long, value_parser = parse_bar_size)]
    bar_width: Option<BarSize>,

    /// Bar height: cells (4) or a fraction of the region (0.25)
    #[arg(long, value_parser = parse_bar_size)]
    bar_height: Option<BarSize>,

    /// Only draw the top `bar-height` rows of each bar
    #[arg(long)]
    fixed_height: bool,

    /// Cells between bars (0-8)
    #[arg(short, long)]
    padding: Option<usize>,

    #[arg(short, long, value_enum)]
    orientation: Option<Orientation>,

    /// Placement of the two stereo channels
    #[arg(short, long, value_enum)]
    layout: Option<StereoLayout>,

    /// Mix both channels into one set of bars
    #[arg(short, long)]
    mono: bool,

    /// Draw bars from the top edge
    #[arg(long)]
    flip: bool,

    /// Reverse bar order
    #[arg(long)]
    reverse: bool,

    /// Use the terminal's default colors
    #[arg(long)]
    no_color: bool,

    /// Fade bars toward the background
    #[arg(long)]
    alpha: bool,

    /// Strength of the alpha fade (0-1)
    #[arg(long)]
    alpha_blend: Option<f64>,

    /// Gradient stops as hex, 2 or 4 of them (e.g. 4feae7,f34b7d)
    #[arg(long, value_delimiter = ',')]
    gradient: Option<Vec<String>>,

    /// Background color as hex
    #[arg(long)]
    background: Option<String>,

    /// Peaks sweep up from the floor instead of falling
    #[arg(long)]
    peak_reverse: bool,

    /// Rotate the gradient hue, one degree every N milliseconds
    #[arg(long, value_name = "MS")]
    color_shift: Option<u64>,

    /// Show frequency labels and the status line
    #[arg(long)]
    overlay: bool,

    /// Write plain frames to FILE instead of the terminal
    #[arg(long, value_name = "FILE")]
    raw_output: Option<PathBuf>,

    /// Frame size for --raw-output
    #[arg(long, value_name = "COLSxROWS", default_value = "80x24", value_parser = parse_dimensions)]
    dimensions: (usize, usize),

    /// Config file [default: ~/.config/termscope/config.toml]
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log to the debug file in the temp directory
    #[arg(short, long)]
    debug: bool,
}

impl Cli {
    /// Command-line flags as the top settings layer.
    fn overrides(&self) -> Settings {
        let on = |flag: bool| flag.then_some(true);
        Settings {
            fps: self.fps,
            window_size: self.window_size,
            sample_rate: self.sample_rate,
            low_pass: self.low_pass,
            high_pass: self.high_pass,
            threshold_min: self.threshold_min,
            threshold_max: self.threshold_max,
            grouping: self.grouping,
            octave_scale: self.octave_scale,
            smoothing: self.smoothing,
            smoothing_width: self.smoothing_width,
            smoothing_threshold: self.smoothing_threshold,
            bar_width: self.bar_width.map(size_setting),
            bar_height: self.bar_height.map(size_setting),
            full_height: self.fixed_height.then_some(false),
            padding: self.padding,
            orientation: self.orientation,
            layout: self.layout,
            mono: on(self.mono),
            flip: on(self.flip),
            reverse: on(self.reverse),
            color: self.no_color.then_some(false),
            alpha: on(self.alpha),
            alpha_blend: self.alpha_blend,
            peak_reverse: on(self.peak_reverse),
            color_shift: self.color_shift.map(|_| true),
            color_shift_ms: self.color_shift,
            overlay: on(self.overlay),
            colors: ColorSettings {
                background: self.background.clone(),
                gradient: self.gradient.clone(),
            },
            motion: MotionSettings::default(),
            ..Settings::default()
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.debug {
        let path = logging::log_path();
        if let Err(e) = logging::init(&path) {
            eprintln!("warning: cannot log to {}: {}", path.display(), e);
        }
    }

    let file = Settings::load(cli.config.as_deref());
    let cfg = cli.overrides().apply(file.apply(Config::default()));
    log::debug!("configuration: {:?}", cfg);

    let raw = cli.raw_output.is_some();
    if !raw && !Terminal::is_tty() {
        return Err(Error::NotATerminal.into());
    }
    if !AudioSource::available() {
        return Err(Error::DeviceUnavailable.into());
    }

    signals::install()?;

    let (output, size) = match &cli.raw_output {
        Some(path) => (Output::Raw(RawSink::create(path)?), cli.dimensions),
        None => {
            let term = Terminal::new()?;
            let size = term.size()?;
            (Output::Terminal(term), size)
        }
    };

    App::new(cfg, output, size)?.run()?;
    log::info!("clean exit");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimensions_parse() {
        assert_eq!(parse_dimensions("80x24"), Ok((80, 24)));
        assert_eq!(parse_dimensions("120X40"), Ok((120, 40)));
        assert!(parse_dimensions("80").is_err());
        assert!(parse_dimensions("0x24").is_err());
    }

    #[test]
    fn flags_override_file_settings() {
        let cli = Cli::try_parse_from([
            "termscope",
            "--fps",
            "45",
            "--mono",
            "--no-color",
            "--bar-width",
            "0.1",
            "--threshold-min",
            "-80",
            "--gradient",
            "ff0000,00ff00",
        ])
        .unwrap();
        let file = Settings::parse("fps = 20\nalpha = true").unwrap();
        let cfg = cli.overrides().apply(file.apply(Config::default()));
        assert_eq!(cfg.fps, 45);
        assert!(cfg.mono);
        assert!(!cfg.color);
        assert!(cfg.alpha);
        assert_eq!(cfg.bar_width, BarSize::Dynamic(0.1));
        assert_eq!(cfg.threshold_min, -80.0);
        assert_eq!(cli.dimensions, (80, 24));
    }

    #[test]
    fn unset_flags_leave_defaults() {
        let cli = Cli::try_parse_from(["termscope"]).unwrap();
        assert_eq!(cli.overrides(), Settings::default());
    }

    #[test]
    fn color_shift_takes_a_period() {
        let cli = Cli::try_parse_from(["termscope", "--color-shift", "250"]).unwrap();
        let cfg = cli.overrides().apply(Config::default());
        assert!(cfg.color_shift);
        assert_eq!(cfg.color_shift_ms, 250);
    }
}
