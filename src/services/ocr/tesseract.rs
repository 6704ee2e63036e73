use super::engine::{OcrEngine, DIGIT_WHITELIST};
use crate::error::{InitError, RecognitionError};
use crate::models::ocr_result::RawText;
use image::GrayImage;
use ::tesseract::{PageSegMode, Tesseract};
use tracing::warn;

/// Tesseract OCR engine configured for a single line of digits
#[derive(Default)]
pub struct TesseractEngine {
    api: Option<Tesseract>,
}

impl TesseractEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure Tesseract for single line recognition (SR is one number)
    fn configure_single_line(mut tesseract: Tesseract) -> Tesseract {
        tesseract.set_page_seg_mode(PageSegMode::PsmSingleLine);
        tesseract
    }

    /// Restrict output to digits and the thousands separator
    fn set_whitelist(tesseract: Tesseract) -> Result<Tesseract, InitError> {
        tesseract
            .set_variable("tessedit_char_whitelist", DIGIT_WHITELIST)
            .map_err(|e| InitError::Recognizer(format!("Failed to set whitelist: {}", e)))
    }
}

impl OcrEngine for TesseractEngine {
    fn init(&mut self, data_path: &str) -> Result<(), InitError> {
        self.shutdown();

        let tesseract = Tesseract::new(Some(data_path), Some("eng")).map_err(|e| {
            InitError::Recognizer(format!("Tesseract init failed (path: {}): {}", data_path, e))
        })?;
        let tesseract = Self::set_whitelist(tesseract)?;
        self.api = Some(Self::configure_single_line(tesseract));

        Ok(())
    }

    fn recognize(&mut self, image: &GrayImage) -> Result<RawText, RecognitionError> {
        let api = self.api.take().ok_or(RecognitionError::Uninitialized)?;

        let (width, height) = (image.width() as i32, image.height() as i32);
        // set_frame consumes the handle; on error the context is gone and the
        // engine reports uninitialized until the next init
        let mut api = api
            .set_frame(image.as_raw(), width, height, 1, width)
            .map_err(|e| {
                warn!("Tesseract rejected image, context dropped: {}", e);
                RecognitionError::Engine(format!("Failed to set image: {}", e))
            })?;

        let text = api.get_text();
        let confidence = api.mean_text_conf();
        self.api = Some(api);

        match text {
            Ok(text) => Ok(RawText::new(text, confidence)),
            Err(e) => {
                warn!("OCR returned null text: {}", e);
                Err(RecognitionError::NoText)
            }
        }
    }

    fn shutdown(&mut self) {
        // Dropping the handle ends and deletes the TessBaseAPI
        self.api = None;
    }

    fn is_initialized(&self) -> bool {
        self.api.is_some()
    }
}
