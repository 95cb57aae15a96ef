//! Drag, stack and snap engine.
//!
//! ## Key Types
//!
//! - `DragEngine`: the per-gesture state machine (`Idle -> Armed -> Dragging`)
//! - `DragSurface`: what the engine reads and writes on the table
//! - `Selection`: the current selection, kept separate from the drag group
//! - `DragEvent`: drop-on-deck and drag-ended notifications
//!
//! Selection and drag-group computation are two explicit steps, see
//! [`compute_selection`] and [`compute_drag_group`].

pub mod engine;
pub mod stack;
pub mod surface;

pub use engine::{DragEngine, DragEvent, DragPhase};
pub use stack::{compute_drag_group, compute_selection, DragGroup};
pub use surface::{DragSurface, ElementKind, ElementView, Selection};
