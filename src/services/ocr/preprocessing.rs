use crate::error::RecognitionError;
use crate::models::frame::{Frame, BYTES_PER_PIXEL};
use crate::models::region::Region;
use image::GrayImage;
use rayon::prelude::*;

/// Luminance of one BGRA pixel: round(0.299 R + 0.587 G + 0.114 B), alpha ignored
#[inline]
pub fn luminance(b: u8, g: u8, r: u8) -> u8 {
    (0.299f32 * r as f32 + 0.587f32 * g as f32 + 0.114f32 * b as f32)
        .round()
        .min(255.0) as u8
}

/// Cut `region` out of `frame` as a single-channel intensity image.
///
/// Rows are converted in parallel; the result is exactly
/// `region.width * region.height` bytes.
pub fn extract_region(frame: &Frame, region: &Region) -> Result<GrayImage, RecognitionError> {
    region.validate_for(frame.width(), frame.height())?;

    let width = region.width as usize;
    let height = region.height as usize;
    let x_offset = region.x as usize * BYTES_PER_PIXEL;

    let mut gray = vec![0u8; width * height];
    gray.par_chunks_mut(width)
        .enumerate()
        .for_each(|(row, dst)| {
            let src = frame.row(region.y as u32 + row as u32);
            let src = &src[x_offset..x_offset + width * BYTES_PER_PIXEL];
            for (out, px) in dst.iter_mut().zip(src.chunks_exact(BYTES_PER_PIXEL)) {
                *out = luminance(px[0], px[1], px[2]);
            }
        });

    GrayImage::from_raw(region.width as u32, region.height as u32, gray)
        .ok_or_else(|| RecognitionError::Engine("grayscale buffer size mismatch".to_string()))
}
