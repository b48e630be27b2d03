use crate::error::QrError;

/// Bytes per RGBA8 pixel
pub const CHANNELS: usize = 4;

/// RGBA8 image, row-major, no row padding.
///
/// `pixels.len() == width * height * 4` holds for every value of this type;
/// the constructors reject anything else. Transforms never mutate a buffer in
/// place, they return a fresh one with the same dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap raw RGBA bytes, checking the length against the dimensions.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, QrError> {
        let expected = Self::byte_len(width, height)?;
        if pixels.len() != expected {
            return Err(QrError::InvalidBufferLength {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Buffer of the given size filled with one RGBA value
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self, QrError> {
        let len = Self::byte_len(width, height)?;
        let mut pixels = Vec::with_capacity(len);
        for _ in 0..len / CHANNELS {
            pixels.extend_from_slice(&rgba);
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Number of bytes a `width x height` buffer holds
    pub fn byte_len(width: u32, height: u32) -> Result<usize, QrError> {
        (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(CHANNELS))
            .ok_or(QrError::DimensionOverflow { width, height })
    }

    /// Get buffer width
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Get buffer height
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of pixels
    pub fn pixel_count(&self) -> usize {
        self.pixels.len() / CHANNELS
    }

    /// Raw RGBA bytes
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Consume the buffer and return its bytes
    pub fn into_raw(self) -> Vec<u8> {
        self.pixels
    }

    /// RGBA value at (x, y), or `None` outside the buffer
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * CHANNELS;
        Some([
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ])
    }

    /// Build a same-sized buffer by mapping every pixel independently.
    pub(crate) fn map_pixels<F>(&self, f: F) -> Self
    where
        F: Fn(&[u8]) -> [u8; 4] + Sync,
    {
        let mut out = vec![0u8; self.pixels.len()];
        crate::utils::for_each_pixel(&self.pixels, &mut out, f);
        self.with_pixels(out)
    }

    /// Same dimensions, new contents. Caller guarantees the length.
    pub(crate) fn with_pixels(&self, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(pixels.len(), self.pixels.len());
        Self {
            width: self.width,
            height: self.height,
            pixels,
        }
    }
}

impl From<image::RgbaImage> for PixelBuffer {
    fn from(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            pixels: img.into_raw(),
        }
    }
}
