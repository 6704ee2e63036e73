pub mod engine;
pub mod parser;
pub mod preprocessing;
pub mod recognizer;
#[cfg(feature = "tesseract")]
pub mod tesseract;

// Re-export main types
pub use engine::OcrEngine;
pub use parser::{clean_digits, parse_sr};
pub use preprocessing::extract_region;
pub use recognizer::Recognizer;
#[cfg(feature = "tesseract")]
pub use self::tesseract::TesseractEngine;
