pub mod config;
pub mod frame;
pub mod ocr_result;
pub mod region;
