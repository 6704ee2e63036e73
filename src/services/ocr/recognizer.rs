use super::engine::OcrEngine;
use super::parser::{clean_digits, parse_sr};
use crate::error::{InitError, RecognitionError};
use crate::models::ocr_result::Recognition;
use image::GrayImage;
use tracing::{debug, error, info};

/// Results below this mean confidence are treated as partial or occluded captures
pub const MIN_CONFIDENCE: i32 = 50;

/// Turns an intensity image into a validated SR value.
///
/// Owns the engine handle; the engine can be swapped for a scripted one in
/// tests. A failed (re)initialization leaves the recognizer uninitialized
/// until the next successful `init`.
pub struct Recognizer {
    engine: Box<dyn OcrEngine>,
    data_path: Option<String>,
}

impl Recognizer {
    pub fn new(engine: Box<dyn OcrEngine>) -> Self {
        Self {
            engine,
            data_path: None,
        }
    }

    /// (Re)initialize the engine with `data_path`
    pub fn init(&mut self, data_path: &str) -> Result<(), InitError> {
        if self.engine.is_initialized() {
            info!(data_path, "Re-initializing recognizer");
            self.engine.shutdown();
        }
        self.data_path = None;

        match self.engine.init(data_path) {
            Ok(()) => {
                info!(data_path, "Recognizer initialized");
                self.data_path = Some(data_path.to_string());
                Ok(())
            }
            Err(e) => {
                error!(data_path, "Recognizer init failed, recognition disabled: {}", e);
                self.engine.shutdown();
                Err(e)
            }
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.data_path.is_some() && self.engine.is_initialized()
    }

    /// Data path of the live engine context
    pub fn data_path(&self) -> Option<&str> {
        self.data_path.as_deref()
    }

    /// Recognize and validate the SR value in `image`
    pub fn recognize(&mut self, image: &GrayImage) -> Result<Recognition, RecognitionError> {
        if !self.is_initialized() {
            return Err(RecognitionError::Uninitialized);
        }

        let raw = self.engine.recognize(image)?;

        if raw.text.trim().is_empty() {
            return Err(RecognitionError::NoText);
        }

        if raw.confidence < MIN_CONFIDENCE {
            debug!(confidence = raw.confidence, raw_text = %raw.text.trim(), "OCR low confidence");
            return Err(RecognitionError::LowConfidence {
                confidence: raw.confidence,
                raw_text: raw.text,
            });
        }

        let value = parse_sr(&raw.text)?;

        debug!(
            value,
            confidence = raw.confidence,
            digits = %clean_digits(&raw.text),
            "OCR result"
        );

        Ok(Recognition {
            value,
            confidence: raw.confidence,
        })
    }

    pub fn shutdown(&mut self) {
        self.engine.shutdown();
        self.data_path = None;
    }
}

impl Drop for Recognizer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
