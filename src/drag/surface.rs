//! What the drag engine sees of the table.
//!
//! The engine never touches table instances directly. It reads
//! [`ElementView`]s and writes positions, z-orders and highlight flags
//! through the [`DragSurface`] trait, so it runs headless in tests.

use rustc_hash::FxHashSet;

use crate::cards::DeckSlot;
use crate::core::InstanceId;
use crate::spatial::{Point, Positioned, Rect};

/// Kind of table element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Deck,
    Card,
    Pawn,
    Resource,
}

impl ElementKind {
    /// Tokens move alone and never gather a stack.
    #[must_use]
    pub fn is_no_stack(self) -> bool {
        matches!(self, Self::Pawn | Self::Resource)
    }
}

/// Snapshot of one element's geometry, read fresh every tick.
#[derive(Clone, Debug, PartialEq)]
pub struct ElementView {
    pub id: InstanceId,
    pub kind: ElementKind,
    /// Bounding box in table coordinates.
    pub rect: Rect,
    pub z: u64,
    /// Accepts cards dropped onto it.
    pub drop_target: bool,
}

impl Positioned for ElementView {
    fn rect(&self) -> Rect {
        self.rect
    }

    fn z(&self) -> u64 {
        self.z
    }
}

/// The table as seen by the drag engine.
pub trait DragSurface {
    /// All draggable elements.
    fn elements(&self) -> Vec<ElementView>;

    /// One element, if present.
    fn element(&self, id: InstanceId) -> Option<ElementView> {
        self.elements().into_iter().find(|e| e.id == id)
    }

    /// Move an element's top-left corner (table coordinates).
    fn move_to(&mut self, id: InstanceId, position: Point);

    fn set_z(&mut self, id: InstanceId, z: u64);

    /// Toggle the drop-on-deck hover affordance of a deck.
    fn set_drop_highlight(&mut self, id: InstanceId, highlighted: bool);

    /// The slot a dragged card turns into when dropped on a deck.
    fn drop_payload(&self, id: InstanceId) -> Option<DeckSlot>;
}

/// The set of currently selected elements.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    ids: FxHashSet<InstanceId>,
}

impl Selection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn single(id: InstanceId) -> Self {
        Self::from_ids([id])
    }

    #[must_use]
    pub fn from_ids(ids: impl IntoIterator<Item = InstanceId>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn contains(&self, id: InstanceId) -> bool {
        self.ids.contains(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Is this a selection of more than one element?
    #[must_use]
    pub fn is_multi(&self) -> bool {
        self.ids.len() > 1
    }

    pub fn remove(&mut self, id: InstanceId) {
        self.ids.remove(&id);
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Selected ids in ascending order.
    #[must_use]
    pub fn sorted(&self) -> Vec<InstanceId> {
        let mut ids: Vec<_> = self.ids.iter().copied().collect();
        ids.sort();
        ids
    }
}
