use crate::error::InitError;
use crate::models::config::TrackerConfig;
use crate::models::region::Region;
use crate::services::dispatch::{DispatchClient, EndpointConfig};
use crate::services::frame_relay::FrameRelay;
use crate::services::ocr::{OcrEngine, Recognizer};
use crate::services::overlay::OverlaySink;
use crate::services::reporter::ValueReporter;
use crate::services::sampler::CaptureThrottle;
use crate::services::screen_capture::FrameSource;
use crate::services::tracked_value::TrackedValue;
use crate::services::worker::RecognitionWorker;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// How long shutdown waits for posts still in flight
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// What a sampler tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Manual override active, capture suppressed
    OverrideActive,
    /// Interval not yet elapsed
    Throttled,
    /// No target configured
    NoTarget,
    /// Frame source could not supply a frame
    Unavailable,
    /// Region does not fit the captured frame
    RegionOutOfBounds,
    /// Frame handed to the worker
    Published,
    Stopped,
}

struct SamplerState {
    throttle: CaptureThrottle,
    target: String,
    region: Region,
}

/// The capture-recognize-dispatch pipeline.
///
/// The host drives sampling through [`SrTracker::video_tick`] (or lets
/// [`SrTracker::run_sampler`] do it); recognition runs on a background
/// worker task and changed values fan out to the overlay and endpoint.
pub struct SrTracker {
    sampler: Mutex<SamplerState>,
    frame_source: Arc<dyn FrameSource>,
    relay: Arc<FrameRelay>,
    recognizer: Arc<Mutex<Recognizer>>,
    tracked: Arc<TrackedValue>,
    reporter: Arc<ValueReporter>,
    /// Data path the recognizer should be running with
    recognizer_path: Arc<Mutex<String>>,
    reinit: Mutex<Option<JoinHandle<()>>>,
    runtime: Handle,
    shutdown: CancellationToken,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl SrTracker {
    /// Build the pipeline and spawn the worker. Must be called from within a
    /// tokio runtime.
    ///
    /// A recognizer that fails to initialize does not fail startup; manual
    /// overrides keep working and a later config update may fix it.
    pub fn start(
        config: &TrackerConfig,
        frame_source: Arc<dyn FrameSource>,
        overlay: Arc<dyn OverlaySink>,
        engine: Box<dyn OcrEngine>,
    ) -> Result<Self, InitError> {
        Self::start_with_dispatch(config, frame_source, overlay, engine, DispatchClient::new()?)
    }

    pub fn start_with_dispatch(
        config: &TrackerConfig,
        frame_source: Arc<dyn FrameSource>,
        overlay: Arc<dyn OverlaySink>,
        engine: Box<dyn OcrEngine>,
        dispatch: DispatchClient,
    ) -> Result<Self, InitError> {
        let runtime = Handle::try_current()
            .map_err(|e| InitError::Runtime(e.to_string()))?;

        let shutdown = CancellationToken::new();
        let relay = Arc::new(FrameRelay::new(shutdown.clone()));
        let recognizer = Arc::new(Mutex::new(Recognizer::new(engine)));
        let tracked = Arc::new(TrackedValue::new());
        let reporter = Arc::new(ValueReporter::new(overlay, dispatch, runtime.clone()));

        reporter.set_template(config.display_template());
        reporter.show_pending();

        let tracker = Self {
            sampler: Mutex::new(SamplerState {
                throttle: CaptureThrottle::new(config.interval()),
                target: String::new(),
                region: config.region,
            }),
            frame_source,
            relay: Arc::clone(&relay),
            recognizer: Arc::clone(&recognizer),
            tracked: Arc::clone(&tracked),
            reporter: Arc::clone(&reporter),
            recognizer_path: Arc::new(Mutex::new(config.tessdata_path.clone())),
            reinit: Mutex::new(None),
            runtime: runtime.clone(),
            shutdown: shutdown.clone(),
            worker: Mutex::new(None),
        };
        tracker.apply_config(config);

        let worker = RecognitionWorker::new(relay, recognizer, tracked, reporter, shutdown);
        *tracker.worker.lock() = Some(runtime.spawn(worker.run()));

        info!("SR tracker started");
        Ok(tracker)
    }

    /// Apply a settings update.
    ///
    /// Override, template and endpoint take effect before this returns.
    /// Recognizer (re)initialization runs in the background since the worker
    /// may hold the recognizer for a whole recognition.
    pub fn apply_config(&self, config: &TrackerConfig) {
        {
            let mut sampler = self.sampler.lock();
            sampler.target = config.target.clone();
            sampler.region = config.region;
            sampler.throttle.set_interval(config.interval());
        }

        let template_changed = self.reporter.set_template(config.display_template());

        self.reporter
            .dispatch()
            .configure(EndpointConfig::new(&config.api_url, &config.api_key));

        let was_overridden = self.tracked.is_overridden();
        let reporter = &self.reporter;
        let change = self
            .tracked
            .set_manual_override_then(config.manual_sr, |change| {
                info!("Manual SR override: {}", change.current);
                reporter.report(change.current);
            });
        if change.is_none() {
            if was_overridden && config.manual_override().is_none() {
                info!("Manual SR override cleared, recognition resumes");
            }
            if template_changed {
                self.refresh_overlay();
            }
        }

        self.ensure_recognizer(&config.tessdata_path);
    }

    /// (Re)initialize the recognizer when its data path changed or it is down
    fn ensure_recognizer(&self, data_path: &str) {
        *self.recognizer_path.lock() = data_path.to_string();

        let recognizer = Arc::clone(&self.recognizer);
        let wanted = Arc::clone(&self.recognizer_path);
        let shutdown = self.shutdown.clone();
        let task = self.runtime.spawn_blocking(move || {
            let mut recognizer = recognizer.lock();
            if shutdown.is_cancelled() {
                return;
            }
            // Read under the recognizer lock so the latest path always wins
            let data_path = wanted.lock().clone();
            if recognizer.is_initialized() && recognizer.data_path() == Some(data_path.as_str()) {
                return;
            }
            // Failure is logged by the recognizer; overrides keep working
            let _ = recognizer.init(&data_path);
        });
        *self.reinit.lock() = Some(task);
    }

    /// Wait for the last requested recognizer (re)initialization
    pub async fn recognizer_settled(&self) {
        let task = self.reinit.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!("Recognizer init task failed: {}", e);
            }
        }
    }

    fn refresh_overlay(&self) {
        let reporter = &self.reporter;
        self.tracked.with_current(|current| match current {
            Some(value) => reporter.refresh(value),
            None => reporter.show_pending(),
        });
    }

    /// Sampler entry point; `elapsed` is the time since the previous tick.
    /// Never waits on recognition.
    pub fn video_tick(&self, elapsed: Duration) -> TickOutcome {
        if self.shutdown.is_cancelled() {
            return TickOutcome::Stopped;
        }

        if self.tracked.is_overridden() {
            return TickOutcome::OverrideActive;
        }

        let (target, region) = {
            let mut sampler = self.sampler.lock();
            if !sampler.throttle.advance(elapsed) {
                return TickOutcome::Throttled;
            }
            (sampler.target.clone(), sampler.region)
        };

        if target.is_empty() {
            return TickOutcome::NoTarget;
        }

        let frame = match self.frame_source.capture(&target) {
            Ok(frame) => frame,
            Err(e) => {
                debug!(target = %target, "Skipping tick: {}", e);
                return TickOutcome::Unavailable;
            }
        };

        if !region.fits_within(frame.width(), frame.height()) {
            debug!(
                ?region,
                frame_width = frame.width(),
                frame_height = frame.height(),
                "Skipping tick: region outside frame"
            );
            return TickOutcome::RegionOutOfBounds;
        }

        if self.relay.publish(frame, region) {
            TickOutcome::Published
        } else {
            TickOutcome::Stopped
        }
    }

    /// Make the next tick sample immediately
    pub fn force_capture(&self) {
        match self.tracked.current() {
            Some(value) => info!("Test OCR: current SR = {}", value),
            None => info!("Test OCR: no SR detected yet, check region settings and source"),
        }
        self.sampler.lock().throttle.force();
    }

    /// Drive `video_tick` every `period` until shutdown
    pub async fn run_sampler(self: Arc<Self>, period: Duration) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last = Instant::now();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let now = Instant::now();
                    let elapsed = now - last;
                    last = now;

                    // Frame capture blocks on the OS; keep it off the async workers
                    let tracker = Arc::clone(&self);
                    match tokio::task::spawn_blocking(move || tracker.video_tick(elapsed)).await {
                        Ok(TickOutcome::Stopped) => break,
                        Ok(TickOutcome::Throttled) | Ok(TickOutcome::OverrideActive) => {}
                        Ok(outcome) => debug!(?outcome, "Sampler tick"),
                        Err(e) => warn!("Sampler tick failed: {}", e),
                    }
                }
                _ = self.shutdown.cancelled() => break,
            }
        }
        debug!("Sampler stopped");
    }

    pub fn current_value(&self) -> Option<u32> {
        self.tracked.current()
    }

    pub fn manual_override(&self) -> Option<u32> {
        self.tracked.manual_override()
    }

    pub fn is_recognizer_ready(&self) -> bool {
        self.recognizer.lock().is_initialized()
    }

    pub fn in_flight_dispatches(&self) -> usize {
        self.reporter.in_flight()
    }

    /// Stop sampling and the worker, wait briefly for posts, release the recognizer
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        self.relay.shutdown();

        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                warn!("Worker task failed: {}", e);
            }
        }
        self.recognizer_settled().await;

        self.reporter.drain(SHUTDOWN_GRACE).await;
        self.recognizer.lock().shutdown();
        info!("SR tracker stopped");
    }
}
