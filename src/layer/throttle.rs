use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThrottleDecision {
    /// Run the rebuild now.
    Run,
    /// A rebuild ran within the interval; one trailing run is scheduled.
    Deferred,
}

/// Leading-edge rate limiter with trailing coalescing.
///
/// The first change in a quiet period runs immediately. Further changes inside the interval
/// collapse into one trailing run, due once the interval has passed since the last run.
#[derive(Clone, Debug)]
pub struct RebuildThrottle {
    interval: Duration,
    last_run: Option<Instant>,
    pending: bool,
}

impl RebuildThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_run: None,
            pending: false,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn request(&mut self, now: Instant) -> ThrottleDecision {
        match self.last_run {
            Some(last) if now.saturating_duration_since(last) < self.interval => {
                self.pending = true;
                ThrottleDecision::Deferred
            }
            _ => {
                self.last_run = Some(now);
                self.pending = false;
                ThrottleDecision::Run
            }
        }
    }

    /// When the trailing run becomes due, if one is pending.
    pub fn deadline(&self) -> Option<Instant> {
        if !self.pending {
            return None;
        }
        Some(self.last_run.map_or_else(Instant::now, |t| t + self.interval))
    }

    /// Consume a due trailing run. Returns `true` if the caller should rebuild now.
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.deadline() {
            Some(due) if now >= due => {
                self.pending = false;
                self.last_run = Some(now);
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn cancel(&mut self) {
        self.pending = false;
    }
}
