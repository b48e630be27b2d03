/// RGBA8 pixel buffer shared by every stage
pub mod pixel_buffer;
/// 2D points for symbol corners
pub mod point;
/// Decode results and their metadata
pub mod result;

pub use pixel_buffer::PixelBuffer;
pub use point::Point;
pub use result::{BarcodeFormat, DecodeResult, EngineKind, ResultMeta};
