//! Core geometry types: Point, Size, Rect.
//!
//! These are the foundational coordinate types used throughout girder for
//! positioning and sizing native views. All values are device pixels; native
//! backends scale for display density themselves.

use std::ops::{Add, Neg, Sub};

// ---------------------------------------------------------------------------
// Point
// ---------------------------------------------------------------------------

/// A 2D position or displacement in device pixels.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// The origin.
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    /// Create a new point.
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Add for Point {
    type Output = Point;
    #[inline]
    fn add(self, rhs: Point) -> Point {
        Point { x: self.x + rhs.x, y: self.y + rhs.y }
    }
}

impl Sub for Point {
    type Output = Point;
    #[inline]
    fn sub(self, rhs: Point) -> Point {
        Point { x: self.x - rhs.x, y: self.y - rhs.y }
    }
}

impl Neg for Point {
    type Output = Point;
    #[inline]
    fn neg(self) -> Point {
        Point { x: -self.x, y: -self.y }
    }
}

// ---------------------------------------------------------------------------
// Size
// ---------------------------------------------------------------------------

/// A 2D size in device pixels (width x height).
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    /// A zero-sized size.
    pub const ZERO: Size = Size { width: 0.0, height: 0.0 };

    /// Create a new size.
    #[inline]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Total area (width * height).
    #[inline]
    pub fn area(self) -> f64 {
        self.width * self.height
    }

    /// Whether either dimension is zero or negative.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Convert to a [`Rect`] positioned at the origin.
    #[inline]
    pub const fn to_rect(self) -> Rect {
        Rect { x: 0.0, y: 0.0, width: self.width, height: self.height }
    }
}

// ---------------------------------------------------------------------------
// Rect
// ---------------------------------------------------------------------------

/// A rectangle in device pixels defined by position and size.
///
/// Layout produces one `Rect` per mounted view, in coordinates absolute to
/// the root view's origin.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// An empty rect at the origin.
    pub const ZERO: Rect = Rect { x: 0.0, y: 0.0, width: 0.0, height: 0.0 };

    /// Create a new rect.
    #[inline]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// The right edge: `x + width`.
    #[inline]
    pub fn right(self) -> f64 {
        self.x + self.width
    }

    /// The bottom edge: `y + height`.
    #[inline]
    pub fn bottom(self) -> f64 {
        self.y + self.height
    }

    /// The top-left corner as a [`Point`].
    #[inline]
    pub const fn origin(self) -> Point {
        Point { x: self.x, y: self.y }
    }

    /// The dimensions as a [`Size`].
    #[inline]
    pub const fn size(self) -> Size {
        Size { width: self.width, height: self.height }
    }

    /// Whether the point (x, y) falls inside the rect.
    #[inline]
    pub fn contains(self, x: f64, y: f64) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Whether `self` and `other` overlap.
    #[inline]
    pub fn intersects(self, other: Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// The same rect shifted by `delta`.
    #[inline]
    pub fn translate(self, delta: Point) -> Rect {
        Rect { x: self.x + delta.x, y: self.y + delta.y, ..self }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // Point
    // -----------------------------------------------------------------------

    #[test]
    fn point_new_and_default() {
        assert_eq!(Point::new(3.0, -7.5), Point { x: 3.0, y: -7.5 });
        assert_eq!(Point::default(), Point::ZERO);
    }

    #[test]
    fn point_add_sub_neg() {
        let a = Point::new(1.0, 2.0);
        let b = Point::new(3.0, 4.0);
        assert_eq!(a + b, Point::new(4.0, 6.0));
        assert_eq!(b - a, Point::new(2.0, 2.0));
        assert_eq!(-Point::new(5.0, -3.0), Point::new(-5.0, 3.0));
    }

    // -----------------------------------------------------------------------
    // Size
    // -----------------------------------------------------------------------

    #[test]
    fn size_new_and_constants() {
        assert_eq!(Size::new(320.0, 480.0), Size { width: 320.0, height: 480.0 });
        assert_eq!(Size::ZERO, Size { width: 0.0, height: 0.0 });
        assert_eq!(Size::default(), Size::ZERO);
    }

    #[test]
    fn size_area_and_empty() {
        assert_eq!(Size::new(10.0, 5.0).area(), 50.0);
        assert!(Size::ZERO.is_empty());
        assert!(Size::new(10.0, 0.0).is_empty());
        assert!(!Size::new(1.0, 1.0).is_empty());
    }

    #[test]
    fn size_to_rect() {
        assert_eq!(Size::new(320.0, 480.0).to_rect(), Rect::new(0.0, 0.0, 320.0, 480.0));
    }

    // -----------------------------------------------------------------------
    // Rect
    // -----------------------------------------------------------------------

    #[test]
    fn rect_edges_and_parts() {
        let r = Rect::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(r.right(), 40.0);
        assert_eq!(r.bottom(), 60.0);
        assert_eq!(r.origin(), Point::new(10.0, 20.0));
        assert_eq!(r.size(), Size::new(30.0, 40.0));
    }

    #[test]
    fn rect_contains_edges_exclusive() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(r.contains(0.0, 0.0));
        assert!(r.contains(9.9, 9.9));
        assert!(!r.contains(10.0, 0.0));
        assert!(!r.contains(0.0, 10.0));
        assert!(!r.contains(-0.1, 0.0));
    }

    #[test]
    fn rect_intersects() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(a.intersects(Rect::new(5.0, 5.0, 10.0, 10.0)));
        assert!(!a.intersects(Rect::new(10.0, 0.0, 5.0, 5.0)));
        assert!(!a.intersects(Rect::new(0.0, 20.0, 5.0, 5.0)));
    }

    #[test]
    fn rect_translate() {
        let r = Rect::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(r.translate(Point::new(10.0, -2.0)), Rect::new(11.0, 0.0, 3.0, 4.0));
    }
}
