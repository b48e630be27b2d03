//! Luma conversion: Y = floor(0.299*R + 0.587*G + 0.114*B)
//!
//! Computed in exact integer arithmetic, Y = (299*R + 587*G + 114*B) / 1000,
//! so a grey pixel (v, v, v) maps back to v and converting twice is a no-op.

use super::PARALLEL_MIN_PIXELS;
use crate::models::PixelBuffer;
use crate::models::pixel_buffer::CHANNELS;
use rayon::prelude::*;

/// Coefficients for luma conversion, per mille
const COEF_R: u32 = 299;
const COEF_G: u32 = 587;
const COEF_B: u32 = 114;

/// Luma of one RGB triple
#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((COEF_R * r as u32 + COEF_G * g as u32 + COEF_B * b as u32) / 1000) as u8
}

/// Luma of an RGBA pixel slice (alpha ignored)
#[inline]
pub(crate) fn pixel_luma(px: &[u8]) -> u8 {
    luma(px[0], px[1], px[2])
}

/// Grayscale transform: writes the luma into R, G and B, alpha unchanged.
pub fn grayscale(buffer: &PixelBuffer) -> PixelBuffer {
    buffer.map_pixels(|px| {
        let l = pixel_luma(px);
        [l, l, l, px[3]]
    })
}

/// One luma byte per pixel, row-major. This is the view software engines
/// decode from; alpha is ignored.
pub fn luminance_view(buffer: &PixelBuffer) -> Vec<u8> {
    let src = buffer.pixels();
    let width = buffer.width() as usize;
    let mut gray = vec![0u8; buffer.pixel_count()];
    if width == 0 {
        return gray;
    }

    let fill_row = |(y, row): (usize, &mut [u8])| {
        let row_start = y * width * CHANNELS;
        for (x, out) in row.iter_mut().enumerate() {
            let idx = row_start + x * CHANNELS;
            *out = pixel_luma(&src[idx..idx + 3]);
        }
    };

    if gray.len() >= PARALLEL_MIN_PIXELS {
        gray.par_chunks_mut(width).enumerate().for_each(fill_row);
    } else {
        gray.chunks_mut(width).enumerate().for_each(fill_row);
    }

    gray
}
