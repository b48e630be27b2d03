//! Inversion and light denoise

use super::for_each_row;
use crate::models::PixelBuffer;
use crate::models::pixel_buffer::CHANNELS;

/// Invert R, G and B (`255 - v`); alpha unchanged.
pub fn invert(buffer: &PixelBuffer) -> PixelBuffer {
    buffer.map_pixels(|px| [255 - px[0], 255 - px[1], 255 - px[2], px[3]])
}

/// Light denoise: 3x3 box blur on all four channels.
///
/// Neighbours outside the buffer are skipped, so edge pixels average fewer
/// samples. Each channel is the floor of the mean.
pub fn denoise_light(buffer: &PixelBuffer) -> PixelBuffer {
    let width = buffer.width() as usize;
    let height = buffer.height() as usize;
    let src = buffer.pixels();
    let mut out = vec![0u8; src.len()];

    for_each_row(&mut out, width, |y, row| {
        let y0 = y.saturating_sub(1);
        let y1 = (y + 1).min(height - 1);
        for x in 0..width {
            let x0 = x.saturating_sub(1);
            let x1 = (x + 1).min(width - 1);
            let mut acc = [0u32; 4];
            let mut n = 0u32;
            for ny in y0..=y1 {
                for nx in x0..=x1 {
                    let i = (ny * width + nx) * CHANNELS;
                    for (c, sum) in acc.iter_mut().enumerate() {
                        *sum += src[i + c] as u32;
                    }
                    n += 1;
                }
            }
            for (c, sum) in acc.iter().enumerate() {
                row[x * CHANNELS + c] = (sum / n) as u8;
            }
        }
    });

    buffer.with_pixels(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invert_is_involution() {
        let raw: Vec<u8> = (0..5 * 3 * 4).map(|i| (i * 29 % 256) as u8).collect();
        let buf = PixelBuffer::new(5, 3, raw).unwrap();
        let once = invert(&buf);
        assert_ne!(once, buf);
        assert_eq!(invert(&once), buf);
    }

    #[test]
    fn test_invert_keeps_alpha() {
        let buf = PixelBuffer::new(1, 1, vec![0, 100, 255, 42]).unwrap();
        assert_eq!(invert(&buf).pixel(0, 0), Some([255, 155, 0, 42]));
    }

    #[test]
    fn test_denoise_uniform_is_identity() {
        let buf = PixelBuffer::filled(6, 4, [10, 20, 30, 40]).unwrap();
        assert_eq!(denoise_light(&buf), buf);
    }

    #[test]
    fn test_denoise_edges_average_fewer_samples() {
        // 3x1: corner averages 2 samples, centre 3
        let buf = PixelBuffer::new(3, 1, vec![
            0, 0, 0, 255, //
            90, 90, 90, 255, //
            255, 255, 255, 0,
        ])
        .unwrap();
        let out = denoise_light(&buf);
        assert_eq!(out.pixel(0, 0), Some([45, 45, 45, 255]));
        assert_eq!(out.pixel(1, 0), Some([115, 115, 115, 170]));
        assert_eq!(out.pixel(2, 0), Some([172, 172, 172, 127]));
    }

    #[test]
    fn test_denoise_single_pixel() {
        let buf = PixelBuffer::new(1, 1, vec![1, 2, 3, 4]).unwrap();
        assert_eq!(denoise_light(&buf), buf);
    }
}
