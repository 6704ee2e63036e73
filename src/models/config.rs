use crate::models::region::Region;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_DISPLAY_FORMAT: &str = "SR: {value}";
pub const DEFAULT_TESSDATA_PATH: &str = "tessdata";
pub const DEFAULT_CAPTURE_INTERVAL: f64 = 3.0;
pub const MIN_CAPTURE_INTERVAL: f64 = 0.5;
pub const MAX_CAPTURE_INTERVAL: f64 = 60.0;

/// Complete tracker configuration, as supplied by the host settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrackerConfig {
    /// Name of the monitor or window to sample
    pub target: String,
    pub region: Region,
    /// Seconds between samples
    pub capture_interval: f64,
    pub api_url: String,
    pub api_key: String,
    /// Manual SR override, `0` means inactive
    pub manual_sr: u32,
    pub display_format: String,
    pub tessdata_path: String,
    /// File the binary mirrors the overlay label into
    pub overlay_path: Option<String>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            target: String::new(),
            region: Region::default(),
            capture_interval: DEFAULT_CAPTURE_INTERVAL,
            api_url: String::new(),
            api_key: String::new(),
            manual_sr: 0,
            display_format: DEFAULT_DISPLAY_FORMAT.to_string(),
            tessdata_path: DEFAULT_TESSDATA_PATH.to_string(),
            overlay_path: None,
        }
    }
}

impl TrackerConfig {
    /// Capture interval clamped to 0.5-60 seconds
    pub fn interval(&self) -> Duration {
        let secs = if self.capture_interval.is_nan() {
            DEFAULT_CAPTURE_INTERVAL
        } else {
            self.capture_interval
                .clamp(MIN_CAPTURE_INTERVAL, MAX_CAPTURE_INTERVAL)
        };
        Duration::from_secs_f64(secs)
    }

    /// Display template, falling back to the default when blank
    pub fn display_template(&self) -> &str {
        if self.display_format.trim().is_empty() {
            DEFAULT_DISPLAY_FORMAT
        } else {
            &self.display_format
        }
    }

    /// Active manual override, if any
    pub fn manual_override(&self) -> Option<u32> {
        (self.manual_sr > 0).then_some(self.manual_sr)
    }
}
