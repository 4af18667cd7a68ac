//! Event loop: input, signals and ticks on one thread.

use crate::audio::capture::Capture;
use crate::audio::AudioSource;
use crate::config::{Config, Delta};
use crate::error::Result;
use crate::keys::{self, Action};
use crate::scheduler::{Scheduler, Tick};
use crate::screen::{Renderer, Style};
use crate::signals::{self, Request};
use crate::terminal::{RawSink, Terminal};
use crate::viz::{Stats, Visualizer};
use crossterm::event::Event;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Longest wait when no tick is pending
const IDLE_POLL: Duration = Duration::from_millis(100);

/// Where frames go
pub enum Output {
    Terminal(Terminal),
    /// Glyph grid rewritten to a file every frame
    Raw(RawSink),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub fn channels(cfg: &Config) -> usize {
    if cfg.mono {
        1
    } else {
        2
    }
}

/// Blank-cell style for the current color mode.
pub fn base_style(cfg: &Config) -> Style {
    if cfg.color {
        Style::color(cfg.palette.background, cfg.palette.background)
    } else {
        Style::default()
    }
}

pub struct App {
    cfg: Config,
    /// Restored by the reset key
    startup: Config,
    output: Output,
    renderer: Renderer,
    audio: AudioSource,
    capture: Arc<Capture>,
    viz: Visualizer,
    scheduler: Scheduler,
    rng: StdRng,
    reported_drops: u64,
}

impl App {
    pub fn new(cfg: Config, output: Output, (cols, rows): (usize, usize)) -> Result<Self> {
        let capture = Arc::new(Capture::new(
            cfg.window_size,
            channels(&cfg),
            cfg.sample_rate,
            cfg.low_pass,
            cfg.high_pass,
        ));
        let audio = AudioSource::open(Arc::clone(&capture), channels(&cfg), cfg.sample_rate)?;

        Ok(Self {
            renderer: Renderer::new(cols, rows, base_style(&cfg)),
            viz: Visualizer::new(&cfg),
            scheduler: Scheduler::new(cfg.tick_period()),
            startup: cfg.clone(),
            cfg,
            output,
            audio,
            capture,
            rng: StdRng::from_entropy(),
            reported_drops: 0,
        })
    }

    pub fn run(mut self) -> Result<()> {
        self.audio.start()?;
        self.sync_sample_rate();
        self.scheduler.arm(Instant::now());

        loop {
            if let Some(request) = signals::take() {
                log::debug!("signal request: {:?}", request);
                match request {
                    Request::Shutdown => break,
                    Request::Suspend => self.suspend()?,
                    Request::Continued => self.resume()?,
                }
                continue;
            }

            let timeout = self.scheduler.timeout(Instant::now()).unwrap_or(IDLE_POLL);
            if let Some(event) = self.wait(timeout)? {
                if self.handle_event(event)? == Flow::Quit {
                    break;
                }
            }

            let now = Instant::now();
            if self.scheduler.is_due(now) {
                self.tick(now)?;
            }
        }

        self.shutdown();
        Ok(())
    }

    /// Block for input up to `timeout`. Raw output has no input, so it just sleeps.
    fn wait(&self, timeout: Duration) -> Result<Option<Event>> {
        match &self.output {
            Output::Terminal(term) => Ok(term.poll_event(timeout)?),
            Output::Raw(_) => {
                std::thread::sleep(timeout);
                Ok(None)
            }
        }
    }

    fn handle_event(&mut self, event: Event) -> Result<Flow> {
        match event {
            Event::Key(key) => match keys::action(key) {
                Some(action) => self.perform(action),
                None => Ok(Flow::Continue),
            },
            Event::Resize(cols, rows) => {
                log::debug!("resize to {}x{}", cols, rows);
                self.renderer.resize(usize::from(cols), usize::from(rows));
                Ok(Flow::Continue)
            }
            _ => Ok(Flow::Continue),
        }
    }

    fn perform(&mut self, action: Action) -> Result<Flow> {
        match action {
            Action::Quit => return Ok(Flow::Quit),
            Action::Suspend => self.suspend()?,
            Action::Redraw => self.renderer.redraw(),
            Action::ToggleHelp => self.viz.show_help = !self.viz.show_help,
            Action::ScrollStatus(by) => self.viz.scroll_status(by),
            Action::ToggleCapture => {
                if self.audio.recording() {
                    self.audio.stop();
                } else {
                    self.start_audio();
                }
            }
            Action::Reset => {
                log::debug!("reset to startup configuration");
                self.reconfigure(self.startup.clone());
                self.viz.reset(&self.cfg);
            }
            Action::RandomizePalette => {
                let palette = self.cfg.palette.randomized(&mut self.rng);
                self.adjust(Delta::SetPalette(palette));
            }
            Action::Adjust(delta) => self.adjust(delta),
        }
        Ok(Flow::Continue)
    }

    fn adjust(&mut self, delta: Delta) {
        log::debug!("config delta: {:?}", delta);
        let next = self.cfg.apply(delta);
        self.reconfigure(next);
    }

    /// Install `next` and bring everything derived from the config in line with it.
    fn reconfigure(&mut self, next: Config) {
        let prev = std::mem::replace(&mut self.cfg, next);
        let cfg = &self.cfg;

        if prev.fps != cfg.fps {
            self.scheduler.set_period(cfg.tick_period());
        }
        self.capture.set_layout(cfg.window_size, channels(cfg));
        self.capture.configure(cfg.sample_rate, cfg.low_pass, cfg.high_pass);

        if let Err(e) = self.audio.set_channels(channels(cfg)) {
            log::error!("failed to switch to {} channels: {}", channels(cfg), e);
        }
        if prev.sample_rate != cfg.sample_rate {
            if let Err(e) = self.audio.set_sample_rate(cfg.sample_rate) {
                log::error!("failed to switch sample rate to {}: {}", cfg.sample_rate, e);
            }
        }

        if (prev.threshold_min, prev.threshold_max) != (cfg.threshold_min, cfg.threshold_max) {
            self.viz.reset(cfg);
        }
        if prev.color != cfg.color || prev.palette != cfg.palette {
            self.renderer.set_base(base_style(cfg));
            self.renderer.redraw();
        }
        self.sync_sample_rate();
    }

    fn start_audio(&mut self) {
        match self.audio.start() {
            Ok(()) => self.sync_sample_rate(),
            Err(e) => log::error!("failed to start capture: {}", e),
        }
    }

    /// The device may not run at the requested rate; follow what it picked.
    fn sync_sample_rate(&mut self) {
        let rate = self.audio.sample_rate();
        if !self.audio.recording() || rate == self.cfg.sample_rate {
            return;
        }
        log::info!("device runs at {} Hz instead of {} Hz", rate, self.cfg.sample_rate);
        self.cfg = self.cfg.apply(Delta::SampleRate(rate));
        self.capture.configure(self.cfg.sample_rate, self.cfg.low_pass, self.cfg.high_pass);
    }

    fn tick(&mut self, now: Instant) -> Result<()> {
        let Tick { dt } = self.scheduler.begin_tick(now);
        let dropped = self.scheduler.dropped();
        if dropped > self.reported_drops {
            log::trace!("dropped {} frame(s), {} total", dropped - self.reported_drops, dropped);
            self.reported_drops = dropped;
        }

        let (cols, rows) = self.renderer.size();
        if let Some(delta) = self.viz.update(&self.cfg, &self.capture, cols, rows, dt) {
            self.cfg = self.cfg.apply(delta);
        }

        let stats = Stats {
            actual_fps: self.scheduler.actual_fps(),
            dropped,
            recording: self.audio.recording(),
        };
        self.viz.draw(&self.cfg, self.renderer.buffer(), &stats);

        match &mut self.output {
            Output::Terminal(term) => {
                let frame = self.renderer.render()?;
                term.write_frame(frame)?;
            }
            Output::Raw(sink) => {
                self.renderer.render_raw(sink.frame())?;
                sink.commit()?;
            }
        }

        self.scheduler.finish_tick(Instant::now());
        Ok(())
    }

    fn suspend(&mut self) -> Result<()> {
        log::info!("suspending");
        self.scheduler.suspend();
        self.audio.stop();
        if let Output::Terminal(term) = &mut self.output {
            term.suspend()?;
        }
        signals::stop_self()?;
        self.resume()
    }

    fn resume(&mut self) -> Result<()> {
        log::info!("resuming");
        if let Output::Terminal(term) = &mut self.output {
            term.resume()?;
            let (cols, rows) = term.size()?;
            if (cols, rows) != self.renderer.size() {
                self.renderer.resize(cols, rows);
            }
        }
        self.renderer.redraw();
        self.scheduler.resume(Instant::now());
        self.start_audio();
        Ok(())
    }

    fn shutdown(&mut self) {
        log::info!("shutting down");
        self.scheduler.stop();
        self.audio.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colors::Rgba;

    #[test]
    fn channel_count_follows_mono() {
        let cfg = Config::default();
        assert_eq!(channels(&cfg), 2);
        assert_eq!(channels(&cfg.apply(Delta::ToggleMono)), 1);
    }

    #[test]
    fn base_style_uses_the_background_only_in_color() {
        let cfg = Config::default();
        let style = base_style(&cfg);
        assert_eq!(style.bg, Rgba::opaque(0x1b, 0x1e, 0x24));
        assert_eq!(base_style(&cfg.apply(Delta::ToggleColor)), Style::default());
    }
}
