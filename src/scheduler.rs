//! Fixed-rate tick deadlines aligned to the period boundary.

use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Idle,
    Armed,
    Fired,
    Stopped,
}

/// Timing of one tick, handed to the update step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tick {
    /// Seconds since the previous tick
    pub dt: f64,
}

#[derive(Debug)]
pub struct Scheduler {
    period: Duration,
    state: State,
    deadline: Option<Instant>,
    last_tick: Option<Instant>,
    tick_start: Option<Instant>,
    dropped: u64,
    actual_fps: u32,
}

impl Scheduler {
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_millis(1)),
            state: State::Idle,
            deadline: None,
            last_tick: None,
            tick_start: None,
            dropped: 0,
            actual_fps: 0,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> State {
        self.state
    }

    /// Frames that arrived at least one whole period late, ever.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Rate implied by the last tick-to-tick interval
    pub fn actual_fps(&self) -> u32 {
        self.actual_fps
    }

    /// Takes effect at the next reschedule.
    pub fn set_period(&mut self, period: Duration) {
        self.period = period.max(Duration::from_millis(1));
    }

    /// Schedule the first tick one period from `now`.
    pub fn arm(&mut self, now: Instant) {
        if self.state == State::Stopped {
            return;
        }
        self.deadline = Some(now + self.period);
        self.state = State::Armed;
    }

    /// How long to wait for the deadline; `None` when nothing is pending.
    pub fn timeout(&self, now: Instant) -> Option<Duration> {
        match (self.state, self.deadline) {
            (State::Armed, Some(deadline)) => Some(deadline.saturating_duration_since(now)),
            _ => None,
        }
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.timeout(now) == Some(Duration::ZERO)
    }

    /// Mark the deadline as fired and account for the interval since the last tick.
    pub fn begin_tick(&mut self, now: Instant) -> Tick {
        let dt = match self.last_tick {
            Some(last) => {
                let delta = now.saturating_duration_since(last);
                if delta > self.period {
                    let periods = delta.as_nanos() / self.period.as_nanos();
                    self.dropped += (periods as u64).saturating_sub(1);
                }
                if !delta.is_zero() {
                    self.actual_fps = (1.0 / delta.as_secs_f64()).round() as u32;
                }
                delta.as_secs_f64()
            }
            None => self.period.as_secs_f64(),
        };
        self.last_tick = Some(now);
        self.tick_start = Some(now);
        self.state = State::Fired;
        Tick { dt }
    }

    /// Re-arm on the next period boundary measured from the tick start.
    pub fn finish_tick(&mut self, now: Instant) {
        if self.state != State::Fired {
            return;
        }
        let start = self.tick_start.unwrap_or(now);
        let period = self.period.as_nanos();
        let into = now.saturating_duration_since(start).as_nanos() % period;
        let wait = Duration::from_nanos((period - into) as u64);
        self.deadline = Some(now + wait);
        self.state = State::Armed;
    }

    /// Cancel the pending deadline.
    pub fn suspend(&mut self) {
        if self.state == State::Stopped {
            return;
        }
        self.deadline = None;
        self.state = State::Idle;
    }

    /// Re-arm after a suspend without counting the pause as dropped frames.
    pub fn resume(&mut self, now: Instant) {
        self.last_tick = None;
        self.arm(now);
    }

    pub fn stop(&mut self) {
        self.deadline = None;
        self.state = State::Stopped;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERIOD: Duration = Duration::from_millis(100);

    fn run_tick(s: &mut Scheduler, at: Instant) -> Tick {
        let tick = s.begin_tick(at);
        s.finish_tick(at);
        tick
    }

    #[test]
    fn arms_one_period_out() {
        let t0 = Instant::now();
        let mut s = Scheduler::new(PERIOD);
        assert_eq!(s.state(), State::Idle);
        assert_eq!(s.timeout(t0), None);
        s.arm(t0);
        assert_eq!(s.state(), State::Armed);
        assert_eq!(s.timeout(t0), Some(PERIOD));
        assert!(s.is_due(t0 + PERIOD));
    }

    #[test]
    fn late_ticks_count_whole_missed_periods() {
        let t0 = Instant::now();
        let mut s = Scheduler::new(PERIOD);
        s.arm(t0);
        run_tick(&mut s, t0);
        let tick = run_tick(&mut s, t0 + PERIOD * 7 / 2);
        assert_eq!(s.dropped(), 2);
        assert!((tick.dt - 0.35).abs() < 1e-9);
        assert_eq!(s.actual_fps(), 3);
    }

    #[test]
    fn on_time_ticks_drop_nothing() {
        let t0 = Instant::now();
        let mut s = Scheduler::new(PERIOD);
        s.arm(t0);
        for i in 1..=10 {
            run_tick(&mut s, t0 + PERIOD * i);
        }
        assert_eq!(s.dropped(), 0);
        assert_eq!(s.actual_fps(), 10);
    }

    #[test]
    fn reschedule_lands_on_period_boundary() {
        let t0 = Instant::now();
        let mut s = Scheduler::new(PERIOD);
        s.arm(t0);
        s.begin_tick(t0);
        // The tick's work took 30 ms.
        let done = t0 + Duration::from_millis(30);
        s.finish_tick(done);
        assert_eq!(s.timeout(done), Some(Duration::from_millis(70)));

        // Work that overruns a whole period still aligns.
        s.begin_tick(t0 + PERIOD);
        let done = t0 + PERIOD + Duration::from_millis(130);
        s.finish_tick(done);
        assert_eq!(s.timeout(done), Some(Duration::from_millis(70)));
    }

    #[test]
    fn resume_does_not_count_the_pause() {
        let t0 = Instant::now();
        let mut s = Scheduler::new(PERIOD);
        s.arm(t0);
        run_tick(&mut s, t0);
        s.suspend();
        assert_eq!(s.state(), State::Idle);
        assert_eq!(s.timeout(t0), None);

        let back = t0 + Duration::from_secs(30);
        s.resume(back);
        let tick = run_tick(&mut s, back + PERIOD);
        assert_eq!(s.dropped(), 0);
        assert!((tick.dt - PERIOD.as_secs_f64()).abs() < 1e-9);
    }

    #[test]
    fn period_change_applies_on_reschedule() {
        let t0 = Instant::now();
        let mut s = Scheduler::new(PERIOD);
        s.arm(t0);
        s.begin_tick(t0);
        s.set_period(Duration::from_millis(50));
        s.finish_tick(t0);
        assert_eq!(s.timeout(t0), Some(Duration::from_millis(50)));
    }

    #[test]
    fn stopped_is_terminal() {
        let t0 = Instant::now();
        let mut s = Scheduler::new(PERIOD);
        s.stop();
        s.arm(t0);
        s.resume(t0);
        assert_eq!(s.state(), State::Stopped);
        assert_eq!(s.timeout(t0), None);
    }
}
