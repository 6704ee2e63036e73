use crate::error::{InitError, RecognitionError};
use crate::models::ocr_result::RawText;
use image::GrayImage;

/// Characters the engine may emit: digits and the thousands separator
pub const DIGIT_WHITELIST: &str = "0123456789,";

/// OCR engine trait - abstraction over the underlying text recognition library
///
/// Implementations are configured for a single line of digits. `init` may be
/// called again on a live engine and must release the old context first.
pub trait OcrEngine: Send {
    /// Create the recognition context from the given data directory
    fn init(&mut self, data_path: &str) -> Result<(), InitError>;

    /// Recognize text in an 8-bit grayscale image
    fn recognize(&mut self, image: &GrayImage) -> Result<RawText, RecognitionError>;

    /// Release the recognition context. Safe to call when not initialized.
    fn shutdown(&mut self);

    fn is_initialized(&self) -> bool;
}
