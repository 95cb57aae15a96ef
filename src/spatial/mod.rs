//! Spatial utilities: geometry primitives and overlap tests.
//!
//! ## Key Types
//!
//! - `Point`, `Size`, `Rect`: table-space geometry
//! - `Viewport`: screen origin and zoom scale of the canvas
//! - `Positioned`: the rectangle-plus-depth capability every table
//!   element exposes

pub mod geometry;
pub mod overlap;

pub use geometry::{Point, Rect, Size, Viewport};
pub use overlap::{overlap_ratio, overlaps, significant_overlap, Positioned, SIGNIFICANT_OVERLAP};
