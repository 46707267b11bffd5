//! Percentage-space rectangles and their mapping onto pixel pages.

use serde::{Deserialize, Serialize};

/// A rectangle in page percentages (0-100 on each axis, not enforced).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Map onto a page of the given pixel size.
    pub fn to_pixels(&self, page_width: f64, page_height: f64) -> PixelRect {
        PixelRect {
            x: self.x / 100.0 * page_width,
            y: self.y / 100.0 * page_height,
            width: self.w / 100.0 * page_width,
            height: self.h / 100.0 * page_height,
        }
    }

    /// Whether a point (in percentages) falls inside this rectangle.
    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px <= self.x + self.w && py >= self.y && py <= self.y + self.h
    }

    /// Whether the rectangle lies entirely on the page.
    pub fn is_within_page(&self) -> bool {
        self.x >= 0.0
            && self.y >= 0.0
            && self.w >= 0.0
            && self.h >= 0.0
            && self.x + self.w <= 100.0
            && self.y + self.h <= 100.0
    }
}

/// A rectangle in device pixels, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PixelRect {
    pub fn scaled(&self, factor: f64) -> PixelRect {
        PixelRect {
            x: self.x * factor,
            y: self.y * factor,
            width: self.width * factor,
            height: self.height * factor,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_pixels() {
        let r = Rect::new(10.0, 50.0, 25.0, 10.0);
        let px = r.to_pixels(800.0, 1000.0);
        assert_eq!(px, PixelRect { x: 80.0, y: 500.0, width: 200.0, height: 100.0 });
    }

    #[test]
    fn test_same_rect_scales_with_page() {
        let r = Rect::new(10.0, 10.0, 50.0, 20.0);
        let small = r.to_pixels(400.0, 600.0);
        let big = r.to_pixels(800.0, 1200.0);
        assert_eq!(small.scaled(2.0), big);
    }

    #[test]
    fn test_out_of_bounds_maps_literally() {
        let r = Rect::new(90.0, 0.0, 40.0, 10.0);
        assert!(!r.is_within_page());
        let px = r.to_pixels(100.0, 100.0);
        assert_eq!(px.right(), 130.0);
    }

    #[test]
    fn test_contains() {
        let r = Rect::new(10.0, 10.0, 20.0, 20.0);
        assert!(r.contains(15.0, 29.0));
        assert!(!r.contains(31.0, 15.0));
    }
}
