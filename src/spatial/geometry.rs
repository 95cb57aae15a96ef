//! Geometry primitives: points, sizes, rectangles and the zoomable viewport.
//!
//! Table coordinates are the un-zoomed canvas space where element
//! positions are stored. Screen coordinates are what the pointer reports.
//! [`Viewport`] converts between the two.

use serde::{Deserialize, Serialize};

/// A 2D point (or offset).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Component-wise difference `self - other`.
    #[must_use]
    pub fn minus(self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    /// Component-wise sum.
    #[must_use]
    pub fn plus(self, other: Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Point) -> f64 {
        let d = self.minus(other);
        (d.x * d.x + d.y * d.y).sqrt()
    }
}

/// Width and height.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle, top-left origin.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    #[must_use]
    pub fn from_parts(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    /// Build a normalized rectangle spanning two corners in any order.
    #[must_use]
    pub fn from_corners(a: Point, b: Point) -> Self {
        let x = a.x.min(b.x);
        let y = a.y.min(b.y);
        Self::new(x, y, (a.x - b.x).abs(), (a.y - b.y).abs())
    }

    #[must_use]
    pub fn left(&self) -> f64 {
        self.x
    }

    #[must_use]
    pub fn top(&self) -> f64 {
        self.y
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[must_use]
    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    #[must_use]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Area of the intersection with `other`, zero when disjoint.
    #[must_use]
    pub fn intersection_area(&self, other: &Rect) -> f64 {
        let x_overlap = (self.right().min(other.right()) - self.left().max(other.left())).max(0.0);
        let y_overlap = (self.bottom().min(other.bottom()) - self.top().max(other.top())).max(0.0);
        x_overlap * y_overlap
    }
}

/// The zoomable canvas: where it sits on screen and how much it is scaled.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Screen position of the canvas' table-space origin.
    pub origin: Point,
    /// Zoom factor (screen px per table px).
    pub scale: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            origin: Point::default(),
            scale: 1.0,
        }
    }
}

impl Viewport {
    #[must_use]
    pub fn new(origin: Point, scale: f64) -> Self {
        Self { origin, scale }
    }

    /// Project a table-space rectangle to its on-screen bounding box.
    #[must_use]
    pub fn to_screen(&self, rect: &Rect) -> Rect {
        Rect::new(
            self.origin.x + rect.x * self.scale,
            self.origin.y + rect.y * self.scale,
            rect.width * self.scale,
            rect.height * self.scale,
        )
    }

    /// Map a screen point back to table space.
    #[must_use]
    pub fn to_table(&self, screen: Point) -> Point {
        Point::new(
            (screen.x - self.origin.x) / self.scale,
            (screen.y - self.origin.y) / self.scale,
        )
    }
}
