//! Axis-aligned overlap tests.
//!
//! The ratio is asymmetric: it is always measured against the area of the
//! second argument, the element being tested for membership or snapping.

use super::geometry::Rect;

/// Overlap ratio above which two elements count as stacked.
pub const SIGNIFICANT_OVERLAP: f64 = 0.5;

/// Anything that occupies a rectangle on the table at some depth.
///
/// Table instances expose this so grouping and snapping never need a
/// rendering tree.
pub trait Positioned {
    /// Bounding box in table coordinates.
    fn rect(&self) -> Rect;

    /// Stacking order, higher is drawn on top.
    fn z(&self) -> u64;
}

/// Do the two boxes intersect? Boxes that merely touch along an edge do not.
#[must_use]
pub fn overlaps(a: &Rect, b: &Rect) -> bool {
    a.left() < b.right() && a.right() > b.left() && a.top() < b.bottom() && a.bottom() > b.top()
}

/// Intersection area divided by the area of `b`, in `[0, 1]`.
///
/// Returns 0 for disjoint boxes and for a degenerate `b`.
///
/// ```
/// use rust_tabletop::spatial::{overlap_ratio, Rect};
///
/// let a = Rect::new(0.0, 0.0, 1.0, 1.0);
/// let b = Rect::new(0.5, 0.0, 1.0, 1.0);
/// assert_eq!(overlap_ratio(&a, &b), 0.5);
/// ```
#[must_use]
pub fn overlap_ratio(a: &Rect, b: &Rect) -> f64 {
    let area = b.area();
    if area <= 0.0 {
        return 0.0;
    }
    (a.intersection_area(b) / area).clamp(0.0, 1.0)
}

/// Does `a` cover more than half of `b`?
#[must_use]
pub fn significant_overlap(a: &Rect, b: &Rect) -> bool {
    overlap_ratio(a, b) > SIGNIFICANT_OVERLAP
}
