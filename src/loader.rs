//! Image loading.
//!
//! Turns a file, an in-memory encoded image or a base64 / data-URL string
//! into an RGBA8 [`PixelBuffer`], downscaling large images first.

use crate::error::QrError;
use crate::models::PixelBuffer;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where an encoded image comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageInput {
    /// A file on disk
    Path(PathBuf),
    /// Encoded image bytes (PNG, JPEG, ...)
    Bytes(Vec<u8>),
    /// Base64 text, optionally as a `data:<mime>;base64,` URL
    Base64(String),
}

impl ImageInput {
    /// Input read from `path`
    pub fn path(path: impl AsRef<Path>) -> Self {
        ImageInput::Path(path.as_ref().to_path_buf())
    }

    /// The encoded image bytes.
    pub fn read_bytes(&self) -> Result<Cow<'_, [u8]>, QrError> {
        let bytes = match self {
            ImageInput::Path(path) => Cow::Owned(fs::read(path)?),
            ImageInput::Bytes(bytes) => Cow::Borrowed(bytes.as_slice()),
            ImageInput::Base64(text) => Cow::Owned(decode_base64(text)?),
        };
        if bytes.is_empty() {
            return Err(QrError::EmptyInput);
        }
        Ok(bytes)
    }
}

impl From<Vec<u8>> for ImageInput {
    fn from(bytes: Vec<u8>) -> Self {
        ImageInput::Bytes(bytes)
    }
}

impl From<&Path> for ImageInput {
    fn from(path: &Path) -> Self {
        ImageInput::path(path)
    }
}

impl From<PathBuf> for ImageInput {
    fn from(path: PathBuf) -> Self {
        ImageInput::Path(path)
    }
}

/// Decode base64 text; a `data:` URL prefix and surrounding whitespace are
/// ignored.
pub fn decode_base64(text: &str) -> Result<Vec<u8>, QrError> {
    let text = text.trim();
    let payload = match text.strip_prefix("data:") {
        Some(rest) => rest.split_once(',').map_or(rest, |(_, data)| data),
        None => text,
    };
    if payload.is_empty() {
        return Err(QrError::EmptyInput);
    }
    Ok(STANDARD.decode(payload)?)
}

/// Output size for an image whose longest side must not exceed `max_dim`.
///
/// Returns `None` when no downscale is needed or `max_dim` is 0.
pub fn downscaled_dimensions(width: u32, height: u32, max_dim: u32) -> Option<(u32, u32)> {
    let longest = width.max(height);
    if max_dim == 0 || longest <= max_dim {
        return None;
    }
    let scale = max_dim as f64 / longest as f64;
    let side = |v: u32| ((v as f64 * scale).round() as u32).max(1);
    Some((side(width), side(height)))
}

fn downscale(img: DynamicImage, max_dim: u32) -> DynamicImage {
    let (width, height) = img.dimensions();
    match downscaled_dimensions(width, height, max_dim) {
        Some((w, h)) => {
            debug!(from_w = width, from_h = height, to_w = w, to_h = h, "downscaling input");
            img.resize_exact(w, h, FilterType::Triangle)
        }
        None => img,
    }
}

/// Decode encoded image bytes into a pixel buffer no larger than `max_dim`
/// on its longest side.
pub fn pixel_buffer_from_bytes(bytes: &[u8], max_dim: u32) -> Result<PixelBuffer, QrError> {
    if bytes.is_empty() {
        return Err(QrError::EmptyInput);
    }
    let img = image::load_from_memory(bytes)?;
    Ok(PixelBuffer::from(downscale(img, max_dim).to_rgba8()))
}

/// Load `input` into a pixel buffer no larger than `max_dim` on its longest
/// side.
pub fn load_pixel_buffer(input: &ImageInput, max_dim: u32) -> Result<PixelBuffer, QrError> {
    let bytes = input.read_bytes()?;
    pixel_buffer_from_bytes(&bytes, max_dim)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageOutputFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x * 7) as u8, (y * 5) as u8, 0, 200])
        });
        let mut out = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut out), ImageOutputFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn test_loads_rgba_without_downscale() {
        let buf = pixel_buffer_from_bytes(&png(10, 4), 1400).unwrap();
        assert_eq!((buf.width(), buf.height()), (10, 4));
        assert_eq!(buf.pixel(3, 2), Some([21, 10, 0, 200]));
    }

    #[test]
    fn test_downscales_longest_side() {
        let buf = pixel_buffer_from_bytes(&png(100, 50), 40).unwrap();
        assert_eq!((buf.width(), buf.height()), (40, 20));
        assert_eq!(buf.pixels().len(), 40 * 20 * 4);
    }

    #[test]
    fn test_downscaled_dimensions() {
        assert_eq!(downscaled_dimensions(100, 50, 100), None);
        assert_eq!(downscaled_dimensions(100, 50, 0), None);
        assert_eq!(downscaled_dimensions(3000, 2000, 1400), Some((1400, 933)));
        assert_eq!(downscaled_dimensions(1000, 1, 10), Some((10, 1)));
    }

    #[test]
    fn test_base64_and_data_url() {
        let bytes = png(3, 3);
        let plain = STANDARD.encode(&bytes);
        let url = format!("  data:image/png;base64,{plain}\n");
        assert_eq!(decode_base64(&plain).unwrap(), bytes);
        assert_eq!(decode_base64(&url).unwrap(), bytes);

        let buf = load_pixel_buffer(&ImageInput::Base64(url), 1400).unwrap();
        assert_eq!(buf.width(), 3);
    }

    #[test]
    fn test_empty_and_invalid_inputs() {
        assert!(matches!(
            load_pixel_buffer(&ImageInput::Bytes(Vec::new()), 1400),
            Err(QrError::EmptyInput)
        ));
        assert!(matches!(decode_base64("data:image/png;base64,"), Err(QrError::EmptyInput)));
        assert!(matches!(decode_base64("not base64!"), Err(QrError::Base64(_))));
        assert!(matches!(
            load_pixel_buffer(&ImageInput::Bytes(vec![1, 2, 3, 4]), 1400),
            Err(QrError::ImageLoad(_))
        ));
        assert!(matches!(
            load_pixel_buffer(&ImageInput::path("/nonexistent/qr.png"), 1400),
            Err(QrError::Io(_))
        ));
    }
}
