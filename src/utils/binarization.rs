//! Binarization transforms
//!
//! All binarizers write 0 (black) or 255 (white) into R, G and B and pass
//! alpha through. A pixel goes black when its luma is at or below the
//! threshold, so ties resolve to black.

use super::for_each_row;
use super::grayscale::{luma, luminance_view, pixel_luma};
use crate::models::PixelBuffer;
use crate::models::pixel_buffer::CHANNELS;
use serde::{Deserialize, Serialize};
use std::fmt;

/// RGB colour triple
pub type Rgb = [u8; 3];

const BLACK: u8 = 0;
const WHITE: u8 = 255;

/// Window presets for [`adaptive_threshold`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdPreset {
    /// 8 px window
    Small,
    /// 16 px window
    Medium,
    /// 32 px window
    Large,
}

impl ThresholdPreset {
    /// All presets, smallest window first
    pub const ALL: [ThresholdPreset; 3] = [
        ThresholdPreset::Small,
        ThresholdPreset::Medium,
        ThresholdPreset::Large,
    ];

    /// Window side length
    pub fn radius(self) -> usize {
        match self {
            ThresholdPreset::Small => 8,
            ThresholdPreset::Medium => 16,
            ThresholdPreset::Large => 32,
        }
    }

    /// Lowercase preset name, as used in pass names
    pub fn as_str(self) -> &'static str {
        match self {
            ThresholdPreset::Small => "small",
            ThresholdPreset::Medium => "medium",
            ThresholdPreset::Large => "large",
        }
    }
}

impl fmt::Display for ThresholdPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[inline]
fn binary_pixel(black: bool, alpha: u8) -> [u8; 4] {
    let v = if black { BLACK } else { WHITE };
    [v, v, v, alpha]
}

/// Local-mean binarization.
///
/// Each pixel is compared with the mean luma of the square window centred on
/// it, `2 * (radius >> 1) + 1` pixels on a side. Window samples that fall off
/// the buffer are clamped to the nearest edge pixel, so every window holds the
/// same number of samples.
///
/// Uses a summed-area table over the edge-replicated luma plane, so the cost
/// does not depend on the preset.
pub fn adaptive_threshold(buffer: &PixelBuffer, preset: ThresholdPreset) -> PixelBuffer {
    let width = buffer.width() as usize;
    let height = buffer.height() as usize;
    if width == 0 || height == 0 {
        return buffer.clone();
    }

    let half = preset.radius() >> 1;
    let side = 2 * half + 1;
    let count = (side * side) as u64;
    let gray = luminance_view(buffer);

    // Integral image over the padded plane; padded (px, py) maps to the
    // clamped source pixel (px - half, py - half).
    let padded_w = width + 2 * half;
    let padded_h = height + 2 * half;
    let stride = padded_w + 1;
    let mut integral = vec![0u64; stride * (padded_h + 1)];
    for py in 0..padded_h {
        let sy = py.saturating_sub(half).min(height - 1);
        let src_row = &gray[sy * width..(sy + 1) * width];
        let mut row_sum = 0u64;
        for px in 0..padded_w {
            let sx = px.saturating_sub(half).min(width - 1);
            row_sum += src_row[sx] as u64;
            integral[(py + 1) * stride + px + 1] = integral[py * stride + px + 1] + row_sum;
        }
    }

    let src = buffer.pixels();
    let mut out = vec![0u8; src.len()];
    for_each_row(&mut out, width, |y, row| {
        for x in 0..width {
            // Window covers padded [x, x + side) x [y, y + side)
            // A + D >= B + C, so add before subtracting
            let sum = integral[(y + side) * stride + x + side] + integral[y * stride + x]
                - integral[y * stride + x + side]
                - integral[(y + side) * stride + x];
            let l = gray[y * width + x] as u64;
            let idx = (y * width + x) * CHANNELS;
            let px = binary_pixel(l * count <= sum, src[idx + 3]);
            row[x * CHANNELS..(x + 1) * CHANNELS].copy_from_slice(&px);
        }
    });

    buffer.with_pixels(out)
}

/// Luma binarization with an optional foreground/background hint.
///
/// With a hint the threshold is the midpoint of the two hint lumas. Without
/// one the threshold is the mean luma of the whole buffer, a linear-time
/// stand-in for Otsu's method.
pub fn color_hint_binarize(buffer: &PixelBuffer, hint: Option<(Rgb, Rgb)>) -> PixelBuffer {
    match hint {
        Some((fg, bg)) => {
            let mid = (luma(fg[0], fg[1], fg[2]) as u16 + luma(bg[0], bg[1], bg[2]) as u16) >> 1;
            buffer.map_pixels(|px| binary_pixel(pixel_luma(px) as u16 <= mid, px[3]))
        }
        None => mean_threshold_binarize(buffer),
    }
}

/// Global mean-luma binarization (no hint available).
pub fn mean_threshold_binarize(buffer: &PixelBuffer) -> PixelBuffer {
    let n = buffer.pixel_count() as u64;
    let sum: u64 = buffer
        .pixels()
        .chunks_exact(CHANNELS)
        .map(|px| pixel_luma(px) as u64)
        .sum();
    buffer.map_pixels(|px| binary_pixel(pixel_luma(px) as u64 * n <= sum, px[3]))
}

/// Nearest-colour binarization: black where the pixel is at least as close
/// (Euclidean RGB) to `foreground` as to `background`.
pub fn color_distance_threshold(
    buffer: &PixelBuffer,
    foreground: Rgb,
    background: Rgb,
) -> PixelBuffer {
    fn dist2(px: &[u8], c: Rgb) -> i32 {
        (0..3)
            .map(|i| {
                let d = px[i] as i32 - c[i] as i32;
                d * d
            })
            .sum()
    }
    buffer.map_pixels(|px| binary_pixel(dist2(px, foreground) <= dist2(px, background), px[3]))
}
