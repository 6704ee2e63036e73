use crate::error::CaptureError;
use chrono::{DateTime, Utc};

/// Bytes per BGRA pixel
pub const BYTES_PER_PIXEL: usize = 4;

/// Immutable snapshot of a video frame.
///
/// Pixels are row-major BGRA; `stride` may exceed `width * 4` when the host
/// pads its rows. The buffer is owned, so handing a frame to another thread
/// moves it instead of aliasing the host's staging memory.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    data: Vec<u8>,
    stride: usize,
    width: u32,
    height: u32,
    captured_at: DateTime<Utc>,
}

impl Frame {
    /// Take ownership of a BGRA buffer
    pub fn new(data: Vec<u8>, stride: usize, width: u32, height: u32) -> Result<Self, CaptureError> {
        if width == 0 || height == 0 {
            return Err(CaptureError::InvalidFrame(format!(
                "empty frame {}x{}",
                width, height
            )));
        }

        let row_bytes = width as usize * BYTES_PER_PIXEL;
        if stride < row_bytes {
            return Err(CaptureError::InvalidFrame(format!(
                "stride {} shorter than row of {} bytes",
                stride, row_bytes
            )));
        }

        // The last row does not need its padding
        let required = stride * (height as usize - 1) + row_bytes;
        if data.len() < required {
            return Err(CaptureError::InvalidFrame(format!(
                "buffer of {} bytes too small for {}x{} at stride {}",
                data.len(),
                width,
                height,
                stride
            )));
        }

        Ok(Self {
            data,
            stride,
            width,
            height,
            captured_at: Utc::now(),
        })
    }

    /// Copy a borrowed BGRA buffer (e.g. a mapped staging surface)
    pub fn copy_from(data: &[u8], stride: usize, width: u32, height: u32) -> Result<Self, CaptureError> {
        let len = (stride * height as usize).min(data.len());
        Self::new(data[..len].to_vec(), stride, width, height)
    }

    /// Build a frame from a tightly packed RGBA image, swapping to BGRA
    pub fn from_rgba(image: &image::RgbaImage) -> Result<Self, CaptureError> {
        let mut data = image.as_raw().clone();
        for pixel in data.chunks_exact_mut(BYTES_PER_PIXEL) {
            pixel.swap(0, 2);
        }
        Self::new(
            data,
            image.width() as usize * BYTES_PER_PIXEL,
            image.width(),
            image.height(),
        )
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// BGRA bytes of one row, without padding
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride;
        &self.data[start..start + self.width as usize * BYTES_PER_PIXEL]
    }
}
