use serde::{Deserialize, Serialize};

/// Axis-aligned face rectangle in image pixel coordinates.
///
/// Detector output is not clipped, so a box may start at negative
/// coordinates or extend past the right/bottom image edge. Clipping happens
/// only when a crop is taken.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingBox {
    pub fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Builds a box from floating-point corners, rounding each edge to the
    /// nearest pixel. Edges and sizes saturate at the `i32` range.
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        let left = x1.round() as i32;
        let top = y1.round() as i32;
        Self {
            left,
            top,
            width: saturate(x2.round() as i32 as i64 - left as i64),
            height: saturate(y2.round() as i32 as i64 - top as i64),
        }
    }

    /// Exclusive right edge.
    pub fn right(&self) -> i64 {
        self.left as i64 + self.width as i64
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> i64 {
        self.top as i64 + self.height as i64
    }

    pub fn area(&self) -> i64 {
        self.width.max(0) as i64 * self.height.max(0) as i64
    }

    /// True when the box lies entirely inside a `width` x `height` image.
    pub fn is_within(&self, width: u32, height: u32) -> bool {
        self.left >= 0
            && self.top >= 0
            && self.right() <= width as i64
            && self.bottom() <= height as i64
    }
}

fn saturate(value: i64) -> i32 {
    value.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}
