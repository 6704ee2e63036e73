pub mod config;
pub mod dispatch;
pub mod display;
pub mod frame_relay;
pub mod ocr;
pub mod overlay;
pub mod reporter;
pub mod sampler;
pub mod screen_capture;
pub mod tracked_value;
pub mod tracker;
pub mod worker;

#[cfg(test)]
pub mod test_support;
