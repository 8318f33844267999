use super::Point;

/// Axis-aligned pixel rectangle, as reported by a region locator.
///
/// `x + width` / `y + height` are exclusive, so a rect is empty when either
/// side has zero length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    /// Left edge
    pub x: u32,
    /// Top edge
    pub y: u32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Rect {
    /// Create a new rect
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// True when the rect covers no pixels
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Top-left corner
    pub fn top_left(&self) -> Point {
        Point::new(self.x as f32, self.y as f32)
    }

    /// Top-right corner (exclusive right edge)
    pub fn top_right(&self) -> Point {
        Point::new((self.x + self.width) as f32, self.y as f32)
    }

    /// Bottom-left corner (exclusive bottom edge)
    pub fn bottom_left(&self) -> Point {
        Point::new(self.x as f32, (self.y + self.height) as f32)
    }
}
