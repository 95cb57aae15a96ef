//! Selection and drag-group computation.
//!
//! Two independent steps run when a drag starts:
//!
//! 1. [`compute_selection`]: the pressed element either keeps the current
//!    multi-selection (if it belongs to it) or replaces it.
//! 2. [`compute_drag_group`]: which elements actually move. A multi-selection
//!    moves as-is; a token moves alone; anything else gathers every element
//!    above it that transitively covers more than half of its own area.

use smallvec::SmallVec;

use super::surface::{ElementView, Selection};
use crate::core::InstanceId;
use crate::spatial::overlap_ratio;

/// Members of a drag group, bottom (lowest z) first.
pub type DragGroup = SmallVec<[InstanceId; 8]>;

/// Decide the selection in effect for a gesture started on `candidate`.
#[must_use]
pub fn compute_selection(candidate: InstanceId, current: &Selection) -> Selection {
    if current.is_multi() && current.contains(candidate) {
        current.clone()
    } else {
        Selection::single(candidate)
    }
}

/// Decide which elements move together with `candidate`.
///
/// `threshold` is the overlap ratio an element must exceed, measured
/// against its own area, to join the stack. Only elements with a strictly
/// higher z than `candidate` are considered, and membership is iterated to
/// a fixed point. The result is sorted by current z, ascending.
#[must_use]
pub fn compute_drag_group(
    candidate: &ElementView,
    selection: &Selection,
    elements: &[ElementView],
    threshold: f64,
) -> DragGroup {
    let mut members: Vec<&ElementView> = if selection.is_multi() && selection.contains(candidate.id) {
        elements.iter().filter(|e| selection.contains(e.id)).collect()
    } else if candidate.kind.is_no_stack() {
        vec![candidate]
    } else {
        stack_above(candidate, elements, threshold)
    };

    members.sort_by_key(|e| (e.z, e.id));
    members.iter().map(|e| e.id).collect()
}

fn stack_above<'a>(
    base: &'a ElementView,
    elements: &'a [ElementView],
    threshold: f64,
) -> Vec<&'a ElementView> {
    let mut above: Vec<&ElementView> = elements
        .iter()
        .filter(|e| e.id != base.id && e.z > base.z)
        .collect();
    above.sort_by_key(|e| e.z);

    let mut stack = vec![base];
    loop {
        let mut added = false;
        for candidate in &above {
            if stack.iter().any(|s| s.id == candidate.id) {
                continue;
            }
            if stack
                .iter()
                .any(|s| overlap_ratio(&s.rect, &candidate.rect) > threshold)
            {
                stack.push(candidate);
                added = true;
            }
        }
        if !added {
            return stack;
        }
    }
}
