use std::time::{Duration, Instant};

/// Stop condition threaded through the search recursion.
pub(crate) trait SearchLimit {
    fn tick(&mut self);
    fn should_stop(&self) -> bool;
}

/// No limit; used by the fixed-depth difficulty search.
pub(crate) struct Unlimited;

impl SearchLimit for Unlimited {
    fn tick(&mut self) {}

    fn should_stop(&self) -> bool {
        false
    }
}

/// Nodes visited between two reads of the clock.
pub(crate) const CLOCK_CHECK_INTERVAL: u64 = 64;

/// Wall-clock budget with an optional node cap that takes over when set, so
/// tests can run the same code path without timing noise.
///
/// The search only sees the deadline through [`SearchLimit::should_stop`],
/// which reads the clock once every [`CLOCK_CHECK_INTERVAL`] ticks.
#[derive(Debug)]
pub(crate) struct Budget {
    start: Instant,
    time_cap: Duration,
    step_cap: Option<u64>,
    steps: u64,
    expired: bool,
}

impl Budget {
    pub(crate) fn new(time_cap_ms: u64) -> Self {
        Self {
            start: Instant::now(),
            time_cap: Duration::from_millis(time_cap_ms),
            step_cap: None,
            steps: 0,
            expired: time_cap_ms == 0,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_step_cap(step_cap: u64) -> Self {
        Self {
            start: Instant::now(),
            time_cap: Duration::MAX,
            step_cap: Some(step_cap),
            steps: 0,
            expired: false,
        }
    }

    pub(crate) fn timed_out(&self) -> bool {
        if let Some(cap) = self.step_cap {
            return self.steps >= cap;
        }
        self.start.elapsed() >= self.time_cap
    }

    pub(crate) fn steps(&self) -> u64 {
        self.steps
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub(crate) fn utilization_percent(&self) -> u8 {
        if let Some(cap) = self.step_cap {
            if cap == 0 {
                return 100;
            }
            return ((self.steps as f64 / cap as f64) * 100.0).round().clamp(0.0, 100.0) as u8;
        }
        if self.time_cap.is_zero() {
            return 100;
        }
        let used = self.start.elapsed().as_secs_f64() / self.time_cap.as_secs_f64();
        (used * 100.0).round().clamp(0.0, 100.0) as u8
    }
}

impl SearchLimit for Budget {
    fn tick(&mut self) {
        self.steps = self.steps.saturating_add(1);
        if self.step_cap.is_none() && self.steps % CLOCK_CHECK_INTERVAL == 0 {
            self.expired = self.start.elapsed() >= self.time_cap;
        }
    }

    fn should_stop(&self) -> bool {
        match self.step_cap {
            Some(cap) => self.steps >= cap,
            None => self.expired,
        }
    }
}
