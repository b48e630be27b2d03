//! Transparency handling
//!
//! A QR code exported with a transparent background only has contrast once it
//! is composited onto something. Flattening removes alpha from the decode so
//! engines see a fully opaque image.

use crate::models::PixelBuffer;
use crate::models::pixel_buffer::CHANNELS;
use serde::{Deserialize, Serialize};

/// Pixels with alpha at or below this value count as transparent.
pub const DEFAULT_ALPHA_THRESHOLD: u8 = 252;

/// Solid colour transparent pixels are flattened onto
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Background {
    /// 255, 255, 255
    White,
    /// 0, 0, 0
    Black,
}

impl Background {
    /// RGB value of the background
    pub fn rgb(self) -> [u8; 3] {
        match self {
            Background::White => [255, 255, 255],
            Background::Black => [0, 0, 0],
        }
    }

    /// Lowercase name, as used in pass names
    pub fn as_str(self) -> &'static str {
        match self {
            Background::White => "white",
            Background::Black => "black",
        }
    }
}

/// Replace every pixel with alpha `<= threshold` by `background`, keep the
/// colour of the rest, and force alpha to 255 everywhere.
pub fn flatten_transparent(
    buffer: &PixelBuffer,
    background: Background,
    threshold: u8,
) -> PixelBuffer {
    let [r, g, b] = background.rgb();
    buffer.map_pixels(|px| {
        if px[3] <= threshold {
            [r, g, b, 255]
        } else {
            [px[0], px[1], px[2], 255]
        }
    })
}

/// Whether any pixel has alpha `<= threshold`.
pub fn has_transparency(buffer: &PixelBuffer, threshold: u8) -> bool {
    buffer
        .pixels()
        .chunks_exact(CHANNELS)
        .any(|px| px[3] <= threshold)
}
