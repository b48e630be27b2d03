//! Shared fixtures: a known-good version 1-M symbol rendered into pixel
//! buffers, and deterministic noise.

#![allow(dead_code)]

use image::{DynamicImage, ImageOutputFormat, RgbaImage};
use qr_cascade::PixelBuffer;
use std::io::Cursor;

/// Payload encoded in [`SYMBOL`]
pub const PAYLOAD: &str = "4376471154038";

/// Version 1, EC level M, mask 7, numeric mode. `#` is a dark module.
pub const SYMBOL: [&str; 21] = [
    "#######.....#.#######",
    "#.....#..#....#.....#",
    "#.###.#...##..#.###.#",
    "#.###.#...#...#.###.#",
    "#.###.#..####.#.###.#",
    "#.....#.#.#...#.....#",
    "#######.#.#.#.#######",
    ".........#...........",
    "#..#.##.######.#.....",
    "###.#..##..#.#.#.##..",
    "#..#.####.##..###...#",
    "..#.#..#....#####....",
    "..#...##.#.#.###.##..",
    "........#.#..####.##.",
    "#######...###.#.####.",
    "#.....#.#.....##....#",
    "#.###.#..##.###..#.##",
    "#.###.#.#.#..####..##",
    "#.###.#..###.###.#..#",
    "#.....#..####..##..#.",
    "#######.###..#.###...",
];

/// Pixels per module
pub const SCALE: u32 = 4;
/// Quiet zone width in modules
pub const QUIET: u32 = 4;

/// Side length of a rendered symbol in pixels
pub fn side() -> u32 {
    (SYMBOL.len() as u32 + 2 * QUIET) * SCALE
}

fn is_dark(x: u32, y: u32) -> bool {
    let (mx, my) = (x / SCALE, y / SCALE);
    let n = SYMBOL.len() as u32;
    if mx < QUIET || my < QUIET || mx >= QUIET + n || my >= QUIET + n {
        return false;
    }
    SYMBOL[(my - QUIET) as usize].as_bytes()[(mx - QUIET) as usize] == b'#'
}

/// Render the symbol, choosing each pixel's RGBA by module colour.
pub fn render(dark: [u8; 4], light: [u8; 4]) -> PixelBuffer {
    let side = side();
    let raw = (0..side)
        .flat_map(|y| (0..side).map(move |x| if is_dark(x, y) { dark } else { light }))
        .flatten()
        .collect();
    PixelBuffer::new(side, side, raw).unwrap()
}

/// Black modules on a white background, fully opaque
pub fn opaque_symbol() -> PixelBuffer {
    render([0, 0, 0, 255], [255, 255, 255, 255])
}

/// Opaque white modules on full transparency. Only readable once flattened
/// onto black and inverted.
pub fn transparent_symbol() -> PixelBuffer {
    render([255, 255, 255, 255], [0, 0, 0, 0])
}

/// Light modules on a dark background
pub fn inverted_symbol() -> PixelBuffer {
    render([255, 255, 255, 255], [0, 0, 0, 255])
}

/// Deterministic RGB noise (linear congruential generator)
pub fn noise(width: u32, height: u32, seed: u32) -> PixelBuffer {
    let mut state = seed;
    let raw = (0..width * height * 4)
        .map(|i| {
            if i % 4 == 3 {
                return 255;
            }
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (state >> 24) as u8
        })
        .collect();
    PixelBuffer::new(width, height, raw).unwrap()
}

/// PNG-encode a buffer
pub fn png_bytes(buffer: &PixelBuffer) -> Vec<u8> {
    let img =
        RgbaImage::from_raw(buffer.width(), buffer.height(), buffer.pixels().to_vec()).unwrap();
    let mut out = Vec::new();
    DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut out), ImageOutputFormat::Png)
        .unwrap();
    out
}
