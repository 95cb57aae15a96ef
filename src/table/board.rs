//! The live table: every deck, card, pawn and resource instance.

use serde::{Deserialize, Serialize};

use super::instance::{TableCard, TableDeck, TablePawn, TableResource};
use crate::cards::DeckSlot;
use crate::core::{DeckId, InstanceId};
use crate::drag::{DragSurface, ElementView};
use crate::spatial::{overlaps, Point, Rect};

/// All instances on the table, in insertion order.
///
/// Also the `tableState` section of a snapshot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    #[serde(default)]
    pub decks: Vec<TableDeck>,
    #[serde(default)]
    pub cards: Vec<TableCard>,
    #[serde(default)]
    pub pawns: Vec<TablePawn>,
    #[serde(default)]
    pub resources: Vec<TableResource>,
}

impl Table {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.decks.len() + self.cards.len() + self.pawns.len() + self.resources.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.decks.clear();
        self.cards.clear();
        self.pawns.clear();
        self.resources.clear();
    }

    #[must_use]
    pub fn deck(&self, id: InstanceId) -> Option<&TableDeck> {
        self.decks.iter().find(|d| d.id == id)
    }

    pub fn deck_mut(&mut self, id: InstanceId) -> Option<&mut TableDeck> {
        self.decks.iter_mut().find(|d| d.id == id)
    }

    #[must_use]
    pub fn card(&self, id: InstanceId) -> Option<&TableCard> {
        self.cards.iter().find(|c| c.id == id)
    }

    pub fn card_mut(&mut self, id: InstanceId) -> Option<&mut TableCard> {
        self.cards.iter_mut().find(|c| c.id == id)
    }

    #[must_use]
    pub fn pawn(&self, id: InstanceId) -> Option<&TablePawn> {
        self.pawns.iter().find(|p| p.id == id)
    }

    #[must_use]
    pub fn resource(&self, id: InstanceId) -> Option<&TableResource> {
        self.resources.iter().find(|r| r.id == id)
    }

    pub fn resource_mut(&mut self, id: InstanceId) -> Option<&mut TableResource> {
        self.resources.iter_mut().find(|r| r.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: InstanceId) -> bool {
        self.placement(id).is_some()
    }

    /// The side deck spawned for stored deck `target`.
    #[must_use]
    pub fn side_deck(&self, target: &DeckId) -> Option<&TableDeck> {
        self.decks
            .iter()
            .find(|d| d.is_side_deck() && &d.deck_id == target)
    }

    pub fn side_deck_mut(&mut self, target: &DeckId) -> Option<&mut TableDeck> {
        self.decks
            .iter_mut()
            .find(|d| d.is_side_deck() && &d.deck_id == target)
    }

    /// The first deck in table order carrying `handle`.
    pub fn deck_by_handle_mut(&mut self, handle: &str) -> Option<&mut TableDeck> {
        self.decks.iter_mut().find(|d| d.has_handle(handle))
    }

    /// Remove any instance. Returns whether something was removed.
    pub fn remove(&mut self, id: InstanceId) -> bool {
        let before = self.len();
        self.decks.retain(|d| d.id != id);
        self.cards.retain(|c| c.id != id);
        self.pawns.retain(|p| p.id != id);
        self.resources.retain(|r| r.id != id);
        self.len() != before
    }

    /// Every instance whose box intersects `area`.
    #[must_use]
    pub fn intersecting(&self, area: &Rect) -> Vec<InstanceId> {
        self.elements()
            .into_iter()
            .filter(|e| overlaps(&e.rect, area))
            .map(|e| e.id)
            .collect()
    }

    /// Highest instance id in use, 0 for an empty table.
    #[must_use]
    pub fn max_instance_id(&self) -> u32 {
        self.elements().iter().map(|e| e.id.raw()).max().unwrap_or(0)
    }

    /// Highest z-order in use, 0 for an empty table.
    #[must_use]
    pub fn max_z(&self) -> u64 {
        self.elements().iter().map(|e| e.z).max().unwrap_or(0)
    }

    fn placement(&self, id: InstanceId) -> Option<(Point, u64)> {
        self.elements()
            .into_iter()
            .find(|e| e.id == id)
            .map(|e| (e.rect.origin(), e.z))
    }

    fn placement_mut(&mut self, id: InstanceId) -> Option<(&mut Point, &mut u64)> {
        if let Some(d) = self.decks.iter_mut().find(|d| d.id == id) {
            return Some((&mut d.position, &mut d.z));
        }
        if let Some(c) = self.cards.iter_mut().find(|c| c.id == id) {
            return Some((&mut c.position, &mut c.z));
        }
        if let Some(p) = self.pawns.iter_mut().find(|p| p.id == id) {
            return Some((&mut p.position, &mut p.z));
        }
        self.resources
            .iter_mut()
            .find(|r| r.id == id)
            .map(|r| (&mut r.position, &mut r.z))
    }
}

impl DragSurface for Table {
    fn elements(&self) -> Vec<ElementView> {
        self.decks
            .iter()
            .map(TableDeck::view)
            .chain(self.cards.iter().map(TableCard::view))
            .chain(self.pawns.iter().map(TablePawn::view))
            .chain(self.resources.iter().map(TableResource::view))
            .collect()
    }

    fn move_to(&mut self, id: InstanceId, position: Point) {
        if let Some((pos, _)) = self.placement_mut(id) {
            *pos = position;
        }
    }

    fn set_z(&mut self, id: InstanceId, z: u64) {
        if let Some((_, current)) = self.placement_mut(id) {
            *current = z;
        }
    }

    fn set_drop_highlight(&mut self, id: InstanceId, highlighted: bool) {
        if let Some(deck) = self.deck_mut(id) {
            deck.highlighted = highlighted;
        }
    }

    fn drop_payload(&self, id: InstanceId) -> Option<DeckSlot> {
        self.card(id).map(TableCard::as_slot)
    }
}
