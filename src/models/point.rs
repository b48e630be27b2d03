use serde::{Deserialize, Serialize};

/// 2D point with floating point coordinates
///
/// Corner points reported by the engines live in the coordinate space of the
/// buffer that was decoded, which is the pass buffer and not necessarily the
/// original image.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate
    pub x: f32,
    /// Y coordinate
    pub y: f32,
}

impl Point {
    /// Create a new point
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}
