//! Pointer-delta to percentage-geometry mapping for move and resize drags.
//!
//! A drag records where it started: the element's rectangle, the pointer's
//! client position and the page container's size in pixels. Every pointer
//! move is interpreted relative to that anchor, never incrementally, so
//! rounding can't accumulate over a long drag.

use crate::model::Rect;

/// Smallest width a resize can produce, in page percent.
pub const MIN_WIDTH: f64 = 5.0;
/// Smallest height a resize can produce, in page percent.
pub const MIN_HEIGHT: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    /// Translate the element, keeping its size.
    Move,
    /// Grow or shrink from the fixed top-left corner.
    Resize,
}

/// A point in client (screen) pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Pixel size of the page container the drag happens in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainerSize {
    pub width: f64,
    pub height: f64,
}

impl ContainerSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Everything recorded at pointer-down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragAnchor {
    pub start: Rect,
    pub pointer: Point,
    pub container: ContainerSize,
}

impl DragAnchor {
    /// Pointer travel since pointer-down, in page percent per axis.
    pub fn delta_pct(&self, pointer: Point) -> (f64, f64) {
        (
            pct(pointer.x - self.pointer.x, self.container.width),
            pct(pointer.y - self.pointer.y, self.container.height),
        )
    }

    /// Rectangle after moving the pointer to `pointer`.
    pub fn apply(&self, mode: DragMode, pointer: Point) -> Rect {
        match mode {
            DragMode::Move => moved(self, pointer),
            DragMode::Resize => resized(self, pointer),
        }
    }
}

fn pct(delta_px: f64, size_px: f64) -> f64 {
    if size_px <= 0.0 {
        return 0.0;
    }
    delta_px / size_px * 100.0
}

/// Position clamped to `[0, 100 - size]` on each axis, size unchanged.
pub fn moved(anchor: &DragAnchor, pointer: Point) -> Rect {
    let (dx, dy) = anchor.delta_pct(pointer);
    let start = anchor.start;
    Rect {
        x: clamp_axis(start.x + dx, start.w),
        y: clamp_axis(start.y + dy, start.h),
        ..start
    }
}

/// Size floored at the minimums, unbounded above, origin unchanged.
pub fn resized(anchor: &DragAnchor, pointer: Point) -> Rect {
    let (dx, dy) = anchor.delta_pct(pointer);
    let start = anchor.start;
    Rect {
        w: (start.w + dx).max(MIN_WIDTH),
        h: (start.h + dy).max(MIN_HEIGHT),
        ..start
    }
}

fn clamp_axis(value: f64, size: f64) -> f64 {
    // An element larger than the page pins to 0 instead of panicking in clamp().
    let max = (100.0 - size).max(0.0);
    value.max(0.0).min(max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchor(start: Rect) -> DragAnchor {
        DragAnchor {
            start,
            pointer: Point::new(100.0, 100.0),
            container: ContainerSize::new(500.0, 800.0),
        }
    }

    #[test]
    fn test_move_converts_pixels_to_percent() {
        let a = anchor(Rect::new(10.0, 10.0, 20.0, 10.0));
        let r = moved(&a, Point::new(150.0, 180.0));
        assert!((r.x - 20.0).abs() < 1e-9);
        assert!((r.y - 20.0).abs() < 1e-9);
        assert_eq!((r.w, r.h), (20.0, 10.0));
    }

    #[test]
    fn test_move_clamps_every_step() {
        let a = anchor(Rect::new(40.0, 40.0, 30.0, 25.0));
        let path = [
            (-2000.0, -2000.0),
            (2000.0, 3000.0),
            (100.0, 100.0),
            (900.0, -50.0),
            (-10.0, 5000.0),
        ];
        for (px, py) in path {
            let r = moved(&a, Point::new(px, py));
            assert!(r.x >= 0.0 && r.x <= 100.0 - r.w, "x={} at ({}, {})", r.x, px, py);
            assert!(r.y >= 0.0 && r.y <= 100.0 - r.h, "y={} at ({}, {})", r.y, px, py);
        }
    }

    #[test]
    fn test_move_hits_edges_exactly() {
        let a = anchor(Rect::new(40.0, 40.0, 30.0, 25.0));
        let r = moved(&a, Point::new(5000.0, 5000.0));
        assert_eq!((r.x, r.y), (70.0, 75.0));
        let r = moved(&a, Point::new(-5000.0, -5000.0));
        assert_eq!((r.x, r.y), (0.0, 0.0));
    }

    #[test]
    fn test_move_oversized_element_pins_to_origin() {
        let a = anchor(Rect::new(0.0, 0.0, 120.0, 10.0));
        let r = moved(&a, Point::new(300.0, 100.0));
        assert_eq!(r.x, 0.0);
    }

    #[test]
    fn test_resize_floor() {
        let a = anchor(Rect::new(10.0, 10.0, 20.0, 10.0));
        for (px, py) in [(-10000.0, -10000.0), (0.0, 100.0), (100.0, -400.0)] {
            let r = resized(&a, Point::new(px, py));
            assert!(r.w >= MIN_WIDTH);
            assert!(r.h >= MIN_HEIGHT);
            assert_eq!((r.x, r.y), (10.0, 10.0));
        }
    }

    #[test]
    fn test_resize_has_no_upper_bound() {
        let a = anchor(Rect::new(60.0, 10.0, 30.0, 10.0));
        let r = resized(&a, Point::new(400.0, 100.0));
        assert!((r.w - 90.0).abs() < 1e-9);
        assert!(r.x + r.w > 100.0);
    }

    #[test]
    fn test_zero_container_is_inert() {
        let a = DragAnchor {
            start: Rect::new(10.0, 10.0, 10.0, 10.0),
            pointer: Point::new(0.0, 0.0),
            container: ContainerSize::new(0.0, 0.0),
        };
        assert_eq!(a.apply(DragMode::Move, Point::new(50.0, 50.0)), a.start);
    }
}
