//! Pixel buffer transforms
//!
//! Every transform is a pure function from a [`PixelBuffer`] to a new
//! [`PixelBuffer`] of the same dimensions:
//! - Grayscale (luma) conversion and the luminance view for software engines
//! - Binarization (adaptive local mean, colour hint, colour distance)
//! - Inversion and light denoise
//! - Transparency flattening
//!
//! Large buffers are processed row-parallel with rayon; results are identical
//! to the sequential path.
//!
//! [`PixelBuffer`]: crate::models::PixelBuffer

pub mod alpha;
pub mod binarization;
pub mod filters;
pub mod grayscale;

use crate::models::pixel_buffer::CHANNELS;
use rayon::prelude::*;

/// Below this many pixels the rayon split costs more than it saves.
pub(crate) const PARALLEL_MIN_PIXELS: usize = 256 * 256;

/// Apply `f` to every RGBA pixel of `src`, writing into `dst`.
pub(crate) fn for_each_pixel<F>(src: &[u8], dst: &mut [u8], f: F)
where
    F: Fn(&[u8]) -> [u8; 4] + Sync,
{
    debug_assert_eq!(src.len(), dst.len());
    if src.len() / CHANNELS >= PARALLEL_MIN_PIXELS {
        dst.par_chunks_mut(CHANNELS)
            .zip(src.par_chunks(CHANNELS))
            .for_each(|(out, px)| out.copy_from_slice(&f(px)));
    } else {
        for (out, px) in dst.chunks_mut(CHANNELS).zip(src.chunks(CHANNELS)) {
            out.copy_from_slice(&f(px));
        }
    }
}

/// Fill `dst` one output row at a time; `f(y, row)` writes row `y`.
pub(crate) fn for_each_row<F>(dst: &mut [u8], width: usize, f: F)
where
    F: Fn(usize, &mut [u8]) + Sync,
{
    let row_len = width * CHANNELS;
    if row_len == 0 {
        return;
    }
    if dst.len() / CHANNELS >= PARALLEL_MIN_PIXELS {
        dst.par_chunks_mut(row_len)
            .enumerate()
            .for_each(|(y, row)| f(y, row));
    } else {
        for (y, row) in dst.chunks_mut(row_len).enumerate() {
            f(y, row);
        }
    }
}
