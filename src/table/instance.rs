//! Live table instances.
//!
//! A table instance is a deep copy of a stored definition tied to a
//! position and a z-order. Play mutates the copy only: drawing shrinks a
//! `TableDeck`'s slot sequence without touching the stored `Deck`.

use im::Vector;
use serde::{Deserialize, Serialize};

use crate::cards::{CardRef, Deck, DeckFormat, DeckSlot};
use crate::core::{fisher_yates_vector, CardId, DeckId, InstanceId, Shuffler};
use crate::drag::{ElementKind, ElementView};
use crate::resolve::ResolutionContext;
use crate::spatial::{Point, Positioned, Rect, Size};

/// A deck on the table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDeck {
    pub id: InstanceId,

    /// Stored definition this instance was copied from.
    pub deck_id: DeckId,

    pub name: String,
    pub color: String,
    #[serde(default)]
    pub variable_handle: Option<String>,
    #[serde(default)]
    pub format: DeckFormat,

    /// Remaining draw sequence, front first.
    pub slots: Vector<DeckSlot>,

    pub position: Point,
    pub size: Size,
    pub z: u64,

    /// Set when this deck was auto-spawned as the side deck of another deck.
    #[serde(default)]
    pub side_deck_of: Option<InstanceId>,

    /// Drop-on-deck hover affordance, never persisted.
    #[serde(skip)]
    pub highlighted: bool,
}

impl TableDeck {
    /// Deep-copy a stored deck onto the table.
    #[must_use]
    pub fn from_definition(id: InstanceId, deck: &Deck, position: Point, size: Size, z: u64) -> Self {
        Self {
            id,
            deck_id: deck.id.clone(),
            name: deck.name.clone(),
            color: deck.color.clone(),
            variable_handle: deck.variable_handle.clone(),
            format: deck.format,
            slots: deck.slots.iter().cloned().collect(),
            position,
            size,
            z,
            side_deck_of: None,
            highlighted: false,
        }
    }

    /// Remove and return the top slot.
    pub fn draw(&mut self) -> Option<DeckSlot> {
        self.slots.pop_front()
    }

    /// Put a slot on top, so it is drawn next.
    pub fn push_top(&mut self, slot: DeckSlot) {
        self.slots.push_front(slot);
    }

    pub fn shuffle(&mut self, rng: &mut impl Shuffler) {
        fisher_yates_vector(&mut self.slots, rng);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Targets of the finite random-draw slots still in this deck.
    #[must_use]
    pub fn finite_targets(&self) -> Vec<DeckId> {
        let mut targets: Vec<DeckId> = Vec::new();
        for slot in &self.slots {
            if let CardRef::RandomDraw { deck, finite: true } = &slot.reference {
                if !targets.contains(deck) {
                    targets.push(deck.clone());
                }
            }
        }
        targets
    }

    #[must_use]
    pub fn is_side_deck(&self) -> bool {
        self.side_deck_of.is_some()
    }

    /// Does this deck answer `{HANDLE}` placeholders for `handle`?
    #[must_use]
    pub fn has_handle(&self, handle: &str) -> bool {
        self.variable_handle
            .as_deref()
            .is_some_and(|h| h.eq_ignore_ascii_case(handle))
    }

    #[must_use]
    pub fn view(&self) -> ElementView {
        ElementView {
            id: self.id,
            kind: ElementKind::Deck,
            rect: self.rect(),
            z: self.z,
            drop_target: true,
        }
    }
}

impl Positioned for TableDeck {
    fn rect(&self) -> Rect {
        Rect::from_parts(self.position, self.size)
    }

    fn z(&self) -> u64 {
        self.z
    }
}

/// A card on the table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCard {
    pub id: InstanceId,
    pub card_id: CardId,

    pub position: Point,
    pub size: Size,
    pub z: u64,

    pub color: String,
    #[serde(default)]
    pub face_down: bool,
    #[serde(default)]
    pub starred: bool,
    #[serde(default)]
    pub format: DeckFormat,

    /// Name of the deck it came from, shown on the back when face-down.
    #[serde(default)]
    pub source_name: String,

    /// Placeholder resolutions for this instance.
    #[serde(default)]
    pub resolution: ResolutionContext,
}

impl TableCard {
    /// The slot this card turns back into when dropped onto a deck.
    #[must_use]
    pub fn as_slot(&self) -> DeckSlot {
        let slot = DeckSlot::card(self.card_id.clone());
        if self.starred {
            slot.starred()
        } else {
            slot
        }
    }

    #[must_use]
    pub fn view(&self) -> ElementView {
        ElementView {
            id: self.id,
            kind: ElementKind::Card,
            rect: self.rect(),
            z: self.z,
            drop_target: false,
        }
    }
}

impl Positioned for TableCard {
    fn rect(&self) -> Rect {
        Rect::from_parts(self.position, self.size)
    }

    fn z(&self) -> u64 {
        self.z
    }
}

/// Pawn outline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PawnShape {
    #[default]
    Square,
    Circle,
}

/// A token on the table. Pawns never gather a stack when dragged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TablePawn {
    pub id: InstanceId,
    pub position: Point,
    pub size: Size,
    pub z: u64,
    pub color: String,
    #[serde(default)]
    pub shape: PawnShape,
}

impl TablePawn {
    #[must_use]
    pub fn view(&self) -> ElementView {
        ElementView {
            id: self.id,
            kind: ElementKind::Pawn,
            rect: self.rect(),
            z: self.z,
            drop_target: false,
        }
    }
}

impl Positioned for TablePawn {
    fn rect(&self) -> Rect {
        Rect::from_parts(self.position, self.size)
    }

    fn z(&self) -> u64 {
        self.z
    }
}

/// A labelled counter (life, gold, ...) on the table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableResource {
    pub id: InstanceId,
    pub label: String,
    pub value: i64,
    pub position: Point,
    pub size: Size,
    pub z: u64,
    pub color: String,
}

impl TableResource {
    #[must_use]
    pub fn view(&self) -> ElementView {
        ElementView {
            id: self.id,
            kind: ElementKind::Resource,
            rect: self.rect(),
            z: self.z,
            drop_target: false,
        }
    }
}

impl Positioned for TableResource {
    fn rect(&self) -> Rect {
        Rect::from_parts(self.position, self.size)
    }

    fn z(&self) -> u64 {
        self.z
    }
}
