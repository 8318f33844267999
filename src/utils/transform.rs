//! Orientation and exposure adjustments applied by cascade stages

use crate::models::Point;
use image::{GrayImage, imageops};

/// Orientation hypothesis tried by a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    /// Leave the image as is
    None,
    /// 90 degrees clockwise
    Clockwise90,
    /// 180 degrees
    Half,
    /// 90 degrees counter-clockwise
    CounterClockwise90,
}

impl Rotation {
    /// Rotate `image` into a new buffer
    pub fn apply(self, image: &GrayImage) -> GrayImage {
        match self {
            Rotation::None => image.clone(),
            Rotation::Clockwise90 => imageops::rotate90(image),
            Rotation::Half => imageops::rotate180(image),
            Rotation::CounterClockwise90 => imageops::rotate270(image),
        }
    }

    /// Map a point found in the rotated image back into the coordinates of
    /// the `width x height` image this rotation was applied to.
    pub fn unmap_point(self, p: Point, width: u32, height: u32) -> Point {
        let w = width as f32 - 1.0;
        let h = height as f32 - 1.0;
        match self {
            Rotation::None => p,
            // forward (x, y) -> (h - y, x)
            Rotation::Clockwise90 => Point::new(p.y, h - p.x),
            // forward (x, y) -> (w - x, h - y)
            Rotation::Half => Point::new(w - p.x, h - p.y),
            // forward (x, y) -> (y, w - x)
            Rotation::CounterClockwise90 => Point::new(w - p.y, p.x),
        }
    }
}

/// Add `delta` to every pixel, saturating at 0 and 255
pub fn adjust_brightness(image: &GrayImage, delta: i32) -> GrayImage {
    if delta == 0 {
        return image.clone();
    }
    imageops::brighten(image, delta)
}
