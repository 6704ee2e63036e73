use crate::models::config::DEFAULT_DISPLAY_FORMAT;
use crate::services::dispatch::DispatchClient;
use crate::services::display::{format_display, format_pending};
use crate::services::overlay::OverlaySink;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

/// Fans a changed value out to the overlay and the remote endpoint
pub struct ValueReporter {
    overlay: Arc<dyn OverlaySink>,
    template: RwLock<String>,
    dispatch: DispatchClient,
    tasks: TaskTracker,
    runtime: Handle,
}

impl ValueReporter {
    /// `runtime` hosts the detached dispatch tasks, so `report` can be
    /// called from threads outside the runtime
    pub fn new(overlay: Arc<dyn OverlaySink>, dispatch: DispatchClient, runtime: Handle) -> Self {
        Self {
            overlay,
            template: RwLock::new(DEFAULT_DISPLAY_FORMAT.to_string()),
            dispatch,
            tasks: TaskTracker::new(),
            runtime,
        }
    }

    /// Returns whether the template changed
    pub fn set_template(&self, template: &str) -> bool {
        let mut current = self.template.write();
        if *current == template {
            return false;
        }
        *current = template.to_string();
        true
    }

    pub fn render(&self, value: u32) -> String {
        format_display(&self.template.read(), value)
    }

    pub fn dispatch(&self) -> &DispatchClient {
        &self.dispatch
    }

    /// Show the placeholder label used before any value is known
    pub fn show_pending(&self) {
        let label = format_pending(&self.template.read());
        self.overlay.set_text(&label);
    }

    /// Re-render `value` on the overlay without posting it
    pub fn refresh(&self, value: u32) {
        let label = self.render(value);
        self.overlay.set_text(&label);
    }

    /// Update the overlay now and post the value in the background
    pub fn report(&self, value: u32) {
        let label = self.render(value);
        self.overlay.set_text(&label);
        self.dispatch_detached(value);
    }

    /// Spawn one post of `value`; returns whether a post was started
    pub fn dispatch_detached(&self, value: u32) -> bool {
        if !self.dispatch.is_configured() {
            debug!(value, "API not configured, skipping post");
            return false;
        }

        let client = self.dispatch.clone();
        self.tasks.spawn_on(
            async move {
                client.send(value).await;
            },
            &self.runtime,
        );
        true
    }

    /// Number of posts still running
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Wait for running posts for at most `grace`.
    /// Returns `false` if some were still running when the grace ran out.
    pub async fn drain(&self, grace: Duration) -> bool {
        self.tasks.close();
        let finished = tokio::time::timeout(grace, self.tasks.wait()).await.is_ok();
        // Reopen so later reports are still tracked
        self.tasks.reopen();

        if !finished {
            warn!(
                in_flight = self.tasks.len(),
                "Dispatch still running after {:?}, not waiting further", grace
            );
        }
        finished
    }
}
