use crate::error::CaptureError;
use crate::models::frame::Frame;

/// Supplies frames for a named target.
///
/// Returns `CaptureError::Unavailable` when the target cannot currently be
/// read; the sampler skips that tick.
pub trait FrameSource: Send + Sync {
    fn capture(&self, target: &str) -> Result<Frame, CaptureError>;
}

#[cfg(feature = "screen-capture")]
pub use xcap_source::ScreenFrameSource;

#[cfg(feature = "screen-capture")]
mod xcap_source {
    use super::FrameSource;
    use crate::error::CaptureError;
    use crate::models::frame::Frame;
    use xcap::{Monitor, Window};

    /// Target name selecting the primary monitor
    pub const PRIMARY_TARGET: &str = "primary";

    /// Screen capture source using xcap
    ///
    /// A target names a monitor, or failing that a window title.
    /// `"primary"` selects the primary monitor. Monitors and
    /// windows are looked up on every capture so hot-plugged displays and
    /// re-opened windows are picked up.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct ScreenFrameSource;

    impl ScreenFrameSource {
        pub fn new() -> Self {
            Self
        }

        fn find_monitor(target: &str) -> Result<Option<Monitor>, CaptureError> {
            let monitors = Monitor::all()
                .map_err(|e| CaptureError::Unavailable(format!("Failed to get monitors: {}", e)))?;

            let wants_primary = target.eq_ignore_ascii_case(PRIMARY_TARGET);
            Ok(monitors.into_iter().find(|m| {
                if wants_primary {
                    m.is_primary().unwrap_or(false)
                } else {
                    m.name().map(|name| name == target).unwrap_or(false)
                }
            }))
        }

        fn find_window(target: &str) -> Result<Option<Window>, CaptureError> {
            let windows = Window::all()
                .map_err(|e| CaptureError::Unavailable(format!("Failed to get windows: {}", e)))?;

            Ok(windows.into_iter().find(|w| {
                let minimized = w.is_minimized().unwrap_or(false);
                !minimized && w.title().map(|title| title == target).unwrap_or(false)
            }))
        }
    }

    impl FrameSource for ScreenFrameSource {
        fn capture(&self, target: &str) -> Result<Frame, CaptureError> {
            let image = if let Some(monitor) = Self::find_monitor(target)? {
                monitor
                    .capture_image()
                    .map_err(|e| CaptureError::Unavailable(format!("Failed to capture screen: {}", e)))?
            } else if let Some(window) = Self::find_window(target)? {
                window
                    .capture_image()
                    .map_err(|e| CaptureError::Unavailable(format!("Failed to capture window: {}", e)))?
            } else {
                return Err(CaptureError::Unavailable(format!(
                    "No monitor or window named '{}'",
                    target
                )));
            };

            Frame::from_rgba(&image)
        }
    }

}
