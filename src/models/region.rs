use crate::error::RecognitionError;
use serde::{Deserialize, Serialize};

/// Region of interest inside a frame, in frame pixel coordinates
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Default for Region {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            width: 200,
            height: 60,
        }
    }
}

impl Region {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Positive size and non-negative origin
    pub fn is_valid(&self) -> bool {
        self.x >= 0 && self.y >= 0 && self.width > 0 && self.height > 0
    }

    pub fn x2(&self) -> i64 {
        self.x as i64 + self.width as i64
    }

    pub fn y2(&self) -> i64 {
        self.y as i64 + self.height as i64
    }

    /// Whether the region lies entirely inside a `frame_width` x `frame_height` frame
    pub fn fits_within(&self, frame_width: u32, frame_height: u32) -> bool {
        self.is_valid() && self.x2() <= frame_width as i64 && self.y2() <= frame_height as i64
    }

    /// Reject the region for a frame it does not fit
    pub fn validate_for(&self, frame_width: u32, frame_height: u32) -> Result<(), RecognitionError> {
        if self.fits_within(frame_width, frame_height) {
            Ok(())
        } else {
            Err(RecognitionError::InvalidRegion {
                x: self.x,
                y: self.y,
                width: self.width,
                height: self.height,
                frame_width,
                frame_height,
            })
        }
    }
}
