use crate::models::frame::Frame;
use crate::models::region::Region;
use parking_lot::Mutex;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// A frame and the region to read from it
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureJob {
    pub frame: Frame,
    pub region: Region,
}

/// Outcome of waiting on the relay
#[derive(Debug, PartialEq)]
pub enum RelayEvent {
    Ready(CaptureJob),
    /// Timed out with nothing published
    Empty,
    /// Shutdown was signaled
    Closed,
}

/// Single-slot, latest-value-wins handoff from the sampler to the worker.
///
/// Publishing never blocks and overwrites any job the worker has not taken
/// yet, so backlog is bounded to one frame.
pub struct FrameRelay {
    slot: Mutex<Option<CaptureJob>>,
    ready: Notify,
    shutdown: CancellationToken,
}

impl FrameRelay {
    pub fn new(shutdown: CancellationToken) -> Self {
        Self {
            slot: Mutex::new(None),
            ready: Notify::new(),
            shutdown,
        }
    }

    /// Replace the held job and wake one waiting consumer.
    /// Returns `false` (dropping the job) once the relay is shut down.
    pub fn publish(&self, frame: Frame, region: Region) -> bool {
        if self.shutdown.is_cancelled() {
            return false;
        }

        let replaced = self.slot.lock().replace(CaptureJob { frame, region }).is_some();
        if replaced {
            debug!("Unconsumed frame replaced by newer capture");
        }
        self.ready.notify_one();
        true
    }

    /// Wait up to `timeout` for a job, taking it out of the slot
    pub async fn consume(&self, timeout: Duration) -> RelayEvent {
        let deadline = Instant::now() + timeout;

        loop {
            if self.shutdown.is_cancelled() {
                return RelayEvent::Closed;
            }
            if let Some(job) = self.slot.lock().take() {
                return RelayEvent::Ready(job);
            }

            // A publish between the check above and this wait leaves a
            // stored permit, so the wakeup is not lost
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => return RelayEvent::Closed,
                _ = self.ready.notified() => continue,
                _ = tokio::time::sleep_until(deadline) => {
                    return match self.slot.lock().take() {
                        Some(job) => RelayEvent::Ready(job),
                        None => RelayEvent::Empty,
                    };
                }
            }
        }
    }

    /// Signal shutdown; idempotent. Blocked consumers return `Closed`.
    pub fn shutdown(&self) {
        if !self.shutdown.is_cancelled() {
            debug!("Frame relay shutting down");
        }
        self.shutdown.cancel();
        self.slot.lock().take();
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Whether a job is waiting to be consumed
    pub fn has_pending(&self) -> bool {
        self.slot.lock().is_some()
    }
}
