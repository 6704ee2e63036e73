/// Validated SR value read off a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recognition {
    pub value: u32,
    /// Mean confidence reported by the engine, 0-100
    pub confidence: i32,
}

/// Raw engine output before any validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawText {
    pub text: String,
    pub confidence: i32,
}

impl RawText {
    pub fn new(text: impl Into<String>, confidence: i32) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }
}

/// Transition of the tracked value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueChange {
    pub previous: Option<u32>,
    pub current: u32,
}

