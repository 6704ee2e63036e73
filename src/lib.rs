//! Reads a ranked SR value off live video frames and reports changes to an
//! on-screen overlay and a remote HTTP endpoint.

pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use error::{CaptureError, DispatchError, InitError, RecognitionError};
pub use models::config::TrackerConfig;
pub use models::frame::Frame;
pub use models::region::Region;
pub use services::config::ConfigManager;
pub use services::overlay::{FileOverlaySink, LogOverlaySink, OverlaySink};
pub use services::screen_capture::FrameSource;
pub use services::tracker::{SrTracker, TickOutcome};
