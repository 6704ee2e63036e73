use crate::error::RecognitionError;
use crate::models::ocr_result::Recognition;
use crate::services::frame_relay::{CaptureJob, FrameRelay, RelayEvent};
use crate::services::ocr::{extract_region, Recognizer};
use crate::services::reporter::ValueReporter;
use crate::services::tracked_value::TrackedValue;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Level};

/// How long the worker waits on the relay before re-checking for shutdown
pub const POLL_TIMEOUT: Duration = Duration::from_millis(500);

/// What one recognition cycle produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Nothing published before the poll timeout
    NoFrame,
    Failed(RecognitionError),
    Unchanged(u32),
    Changed { previous: Option<u32>, current: u32 },
    /// A manual override is active; the result was dropped
    Overridden(u32),
    /// Shutdown arrived while recognizing; the result was dropped
    Discarded,
    Stopped,
}

/// Background task draining the relay, recognizing values and reporting changes
pub struct RecognitionWorker {
    relay: Arc<FrameRelay>,
    recognizer: Arc<Mutex<Recognizer>>,
    tracked: Arc<TrackedValue>,
    reporter: Arc<ValueReporter>,
    shutdown: CancellationToken,
    poll_timeout: Duration,
}

impl RecognitionWorker {
    pub fn new(
        relay: Arc<FrameRelay>,
        recognizer: Arc<Mutex<Recognizer>>,
        tracked: Arc<TrackedValue>,
        reporter: Arc<ValueReporter>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            relay,
            recognizer,
            tracked,
            reporter,
            shutdown,
            poll_timeout: POLL_TIMEOUT,
        }
    }

    pub fn with_poll_timeout(mut self, poll_timeout: Duration) -> Self {
        self.poll_timeout = poll_timeout;
        self
    }

    /// Run until shutdown
    pub async fn run(self) {
        info!("Worker started");
        while self.step().await != CycleOutcome::Stopped {}
        info!("Worker stopped");
    }

    /// One Idle -> Recognizing -> Idle/Stopped cycle
    pub async fn step(&self) -> CycleOutcome {
        let job = match self.relay.consume(self.poll_timeout).await {
            RelayEvent::Ready(job) => job,
            RelayEvent::Empty => return CycleOutcome::NoFrame,
            RelayEvent::Closed => return CycleOutcome::Stopped,
        };

        let result = self.recognize(job).await;

        if self.shutdown.is_cancelled() {
            debug!("Shutdown during recognition, result discarded");
            return CycleOutcome::Discarded;
        }

        match result {
            Ok(recognition) => self.apply(recognition),
            Err(e) => {
                log_failure(&e);
                CycleOutcome::Failed(e)
            }
        }
    }

    /// Extraction and OCR are CPU-bound; run them off the async workers
    async fn recognize(&self, job: CaptureJob) -> Result<Recognition, RecognitionError> {
        let recognizer = Arc::clone(&self.recognizer);

        tokio::task::spawn_blocking(move || {
            let image = extract_region(&job.frame, &job.region)?;
            recognizer.lock().recognize(&image)
        })
        .await
        .map_err(|e| RecognitionError::Engine(format!("Recognition task failed: {}", e)))?
    }

    fn apply(&self, recognition: Recognition) -> CycleOutcome {
        let value = recognition.value;

        if self.tracked.is_overridden() {
            debug!(value, "Manual override active, ignoring recognized value");
            return CycleOutcome::Overridden(value);
        }

        // Overlay and post are issued under the value lock so a concurrent
        // override cannot be overwritten by this older result
        let change = self.tracked.accept_recognized_then(value, |change| {
            match change.previous {
                Some(prev) => info!("SR changed: {} -> {}", prev, value),
                None => info!("SR detected: {}", value),
            }
            self.reporter.report(value);
        });

        match change {
            Some(change) => CycleOutcome::Changed {
                previous: change.previous,
                current: change.current,
            },
            None if self.tracked.is_overridden() => CycleOutcome::Overridden(value),
            None => {
                debug!(value, confidence = recognition.confidence, "SR unchanged");
                CycleOutcome::Unchanged(value)
            }
        }
    }
}

fn log_failure(e: &RecognitionError) {
    if e.severity() == Level::WARN {
        warn!(kind = e.kind(), "Recognition failed: {}", e);
    } else {
        debug!(kind = e.kind(), "Recognition failed: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::region::Region;
    use crate::services::dispatch::{DispatchClient, EndpointConfig};
    use crate::services::test_support::{solid_frame, RecordingOverlay, ScriptedEngine, StubServer};
    use tokio::runtime::Handle;

    struct Harness {
        relay: Arc<FrameRelay>,
        tracked: Arc<TrackedValue>,
        reporter: Arc<ValueReporter>,
        engine: ScriptedEngine,
        overlay: RecordingOverlay,
        token: CancellationToken,
        worker: RecognitionWorker,
    }

    fn harness() -> Harness {
        let token = CancellationToken::new();
        let relay = Arc::new(FrameRelay::new(token.clone()));
        let engine = ScriptedEngine::new();
        let mut recognizer = Recognizer::new(Box::new(engine.clone()));
        recognizer.init("tessdata").unwrap();
        let recognizer = Arc::new(Mutex::new(recognizer));
        let tracked = Arc::new(TrackedValue::new());
        let overlay = RecordingOverlay::new();
        let reporter = Arc::new(ValueReporter::new(
            Arc::new(overlay.clone()),
            DispatchClient::new().unwrap(),
            Handle::current(),
        ));

        let worker = RecognitionWorker::new(
            Arc::clone(&relay),
            recognizer,
            Arc::clone(&tracked),
            Arc::clone(&reporter),
            token.clone(),
        )
        .with_poll_timeout(Duration::from_millis(50));

        Harness {
            relay,
            tracked,
            reporter,
            engine,
            overlay,
            token,
            worker,
        }
    }

    fn publish(h: &Harness) {
        h.relay.publish(solid_frame(64, 32), Region::new(4, 4, 40, 20));
    }

    /// Wait until the engine has been entered
    async fn until_recognizing(engine: &ScriptedEngine) {
        for _ in 0..300 {
            if engine.calls() > 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test]
    async fn test_no_frame_is_idle_timeout() {
        let h = harness();
        assert_eq!(h.worker.step().await, CycleOutcome::NoFrame);
        assert_eq!(h.engine.calls(), 0);
    }

    #[tokio::test]
    async fn test_engine_sees_extracted_region() {
        let h = harness();
        h.engine.push_text("1500", 90);
        publish(&h);

        h.worker.step().await;
        assert_eq!(h.engine.last_size(), Some((40, 20)));
    }

    #[tokio::test]
    async fn test_change_detection_and_dispatch() {
        let server = StubServer::respond_with(200).await;
        let h = harness();
        h.reporter
            .dispatch()
            .configure(EndpointConfig::new(&server.url, "key"));

        h.engine.push_text("2,450", 90);
        h.engine.push_text("2450", 88);
        h.engine.push_text("2,500", 93);

        publish(&h);
        assert_eq!(
            h.worker.step().await,
            CycleOutcome::Changed {
                previous: None,
                current: 2450
            }
        );
        publish(&h);
        assert_eq!(h.worker.step().await, CycleOutcome::Unchanged(2450));
        publish(&h);
        assert_eq!(
            h.worker.step().await,
            CycleOutcome::Changed {
                previous: Some(2450),
                current: 2500
            }
        );

        assert!(h.reporter.drain(Duration::from_secs(5)).await);
        assert_eq!(h.overlay.labels(), vec!["SR: 2450", "SR: 2500"]);
        assert_eq!(server.hits(), 2);
        assert_eq!(h.tracked.current(), Some(2500));
    }

    #[tokio::test]
    async fn test_failures_leave_value_untouched() {
        let h = harness();
        h.tracked.accept_recognized(1800);

        h.engine.push_text("2,450", 40);
        h.engine.push_text("123456", 95);
        h.engine.push_text("", 0);

        for _ in 0..3 {
            publish(&h);
            assert!(matches!(h.worker.step().await, CycleOutcome::Failed(_)));
        }
        assert_eq!(h.tracked.current(), Some(1800));
        assert!(h.overlay.labels().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_region_fails_cycle() {
        let h = harness();
        h.relay.publish(solid_frame(16, 16), Region::new(10, 10, 10, 10));

        assert!(matches!(
            h.worker.step().await,
            CycleOutcome::Failed(RecognitionError::InvalidRegion { .. })
        ));
        assert_eq!(h.engine.calls(), 0);
    }

    #[tokio::test]
    async fn test_uninitialized_recognizer_keeps_worker_alive() {
        let h = harness();
        h.worker.recognizer.lock().shutdown();

        publish(&h);
        assert_eq!(
            h.worker.step().await,
            CycleOutcome::Failed(RecognitionError::Uninitialized)
        );
        assert_eq!(h.worker.step().await, CycleOutcome::NoFrame);
    }

    #[tokio::test]
    async fn test_override_suppresses_recognized_value() {
        let h = harness();
        h.tracked.set_manual_override(2200);
        h.engine.push_text("1900", 90);

        publish(&h);
        assert_eq!(h.worker.step().await, CycleOutcome::Overridden(1900));
        assert_eq!(h.tracked.current(), Some(2200));
    }

    #[tokio::test]
    async fn test_shutdown_during_recognition_discards_result() {
        let h = harness();
        h.engine.push_text("1900", 90);
        h.engine.hold();
        publish(&h);

        let (outcome, ()) = tokio::join!(h.worker.step(), async {
            until_recognizing(&h.engine).await;
            h.token.cancel();
            h.engine.release();
        });

        assert_eq!(outcome, CycleOutcome::Discarded);
        assert_eq!(h.tracked.current(), None);
        assert!(h.overlay.labels().is_empty());
        assert_eq!(h.reporter.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_override_during_recognition_wins() {
        let server = StubServer::respond_with(200).await;
        let h = harness();
        h.reporter
            .dispatch()
            .configure(EndpointConfig::new(&server.url, "key"));
        h.engine.push_text("1900", 90);
        h.engine.hold();
        publish(&h);

        let (outcome, ()) = tokio::join!(h.worker.step(), async {
            until_recognizing(&h.engine).await;
            h.tracked
                .set_manual_override_then(2200, |change| h.reporter.report(change.current));
            h.engine.release();
        });

        assert_eq!(outcome, CycleOutcome::Overridden(1900));
        assert_eq!(h.tracked.current(), Some(2200));
        assert_eq!(h.overlay.labels(), vec!["SR: 2200"]);

        assert!(h.reporter.drain(Duration::from_secs(5)).await);
        assert_eq!(server.hits(), 1);
        assert!(server.requests()[0].contains("\"sr\":2200"));
    }

    #[tokio::test]
    async fn test_shutdown_stops_run_loop() {
        let h = harness();
        let Harness { worker, token, relay, .. } = h;

        let handle = tokio::spawn(worker.run());
        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("worker exits promptly")
            .unwrap();
        assert!(relay.is_shutdown());
    }
}
