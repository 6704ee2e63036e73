use thiserror::Error;
use tracing::Level;

/// Failure of one recognition cycle.
///
/// Every variant is absorbed by the recognition worker; none of them stops
/// the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecognitionError {
    #[error("region {x},{y} {width}x{height} does not fit a {frame_width}x{frame_height} frame")]
    InvalidRegion {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        frame_width: u32,
        frame_height: u32,
    },

    #[error("recognizer is not initialized")]
    Uninitialized,

    #[error("recognition returned no text")]
    NoText,

    #[error("confidence {confidence} below threshold (raw: {raw_text:?})")]
    LowConfidence { confidence: i32, raw_text: String },

    #[error("no digits in recognized text {raw_text:?}")]
    NoDigits { raw_text: String },

    #[error("failed to parse digits {digits:?}: {reason}")]
    ParseError { digits: String, reason: String },

    #[error("value {value} out of valid range (0-99999)")]
    OutOfRange { value: u64 },

    #[error("recognition engine failed: {0}")]
    Engine(String),
}

impl RecognitionError {
    /// Severity this failure is logged at.
    ///
    /// Blank or unreadable captures are routine between rounds and only show
    /// up at debug; anything pointing at a misconfigured region is a warning.
    pub fn severity(&self) -> Level {
        match self {
            Self::Uninitialized | Self::NoText | Self::LowConfidence { .. } | Self::NoDigits { .. } => {
                Level::DEBUG
            }
            Self::InvalidRegion { .. }
            | Self::ParseError { .. }
            | Self::OutOfRange { .. }
            | Self::Engine(_) => Level::WARN,
        }
    }

    /// Short kind name used in log lines
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRegion { .. } => "invalid_region",
            Self::Uninitialized => "recognizer_uninitialized",
            Self::NoText => "no_text",
            Self::LowConfidence { .. } => "low_confidence",
            Self::NoDigits { .. } => "no_digits",
            Self::ParseError { .. } => "parse_error",
            Self::OutOfRange { .. } => "out_of_range",
            Self::Engine(_) => "engine",
        }
    }
}

/// Failure to post a value to the remote endpoint
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("endpoint url or api key not configured")]
    NotConfigured,

    #[error("request failed: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    #[error("endpoint returned HTTP {0}")]
    HttpStatus(u16),
}

impl From<reqwest::Error> for DispatchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(e.to_string())
        }
    }
}

/// Setup failure of the recognizer, the HTTP transport or the async runtime
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InitError {
    #[error("recognizer init failed: {0}")]
    Recognizer(String),

    #[error("transport init failed: {0}")]
    Transport(String),

    #[error("no async runtime: {0}")]
    Runtime(String),
}

/// Failure to obtain a frame from the host
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("target unavailable: {0}")]
    Unavailable(String),

    #[error("invalid frame: {0}")]
    InvalidFrame(String),
}
