use std::time::Duration;

/// Throttles frame sampling to at most one sample per interval.
///
/// Elapsed tick time accumulates; once it reaches the interval the tick is
/// due and the accumulator restarts from zero.
#[derive(Debug, Clone)]
pub struct CaptureThrottle {
    interval: Duration,
    since_capture: Duration,
    forced: bool,
}

impl CaptureThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            since_capture: Duration::ZERO,
            forced: false,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    /// Advance by `elapsed`; returns whether a sample is due now
    pub fn advance(&mut self, elapsed: Duration) -> bool {
        self.since_capture = self.since_capture.saturating_add(elapsed);

        if !self.forced && self.since_capture < self.interval {
            return false;
        }

        self.forced = false;
        self.since_capture = Duration::ZERO;
        true
    }

    /// Make the next `advance` due regardless of the interval
    pub fn force(&mut self) {
        self.forced = true;
    }
}
