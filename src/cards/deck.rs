//! Deck definitions and card references.
//!
//! A deck is an ordered sequence of [`DeckSlot`]s. Index 0 is the top of
//! the deck: drawing removes from the front, shuffling permutes the whole
//! sequence with Fisher–Yates.
//!
//! A slot holds a [`CardRef`] (a plain card or an indirect random draw
//! from another deck) plus a `starred` annotation that survives
//! serialization and shuffling.

use serde::{Deserialize, Serialize};

use crate::core::{fisher_yates, CardId, DeckId, Shuffler};

/// Marker suffix used by the legacy string encoding of slots.
const LEGACY_STARRED: &str = ":STARRED";
const LEGACY_RANDOM: &str = "SPECIAL:RANDOM:";
const LEGACY_FINITE: &str = ":FINITE";

/// What a deck slot draws.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CardRef {
    /// A concrete card definition.
    Plain { card: CardId },

    /// Draw a random card from another deck.
    ///
    /// `finite` draws deplete the shared side deck on the table;
    /// infinite draws sample the stored definition without mutating it.
    RandomDraw { deck: DeckId, finite: bool },
}

impl CardRef {
    #[must_use]
    pub fn plain(card: impl Into<CardId>) -> Self {
        Self::Plain { card: card.into() }
    }

    #[must_use]
    pub fn random(deck: impl Into<DeckId>, finite: bool) -> Self {
        Self::RandomDraw {
            deck: deck.into(),
            finite,
        }
    }

    #[must_use]
    pub fn is_special(&self) -> bool {
        matches!(self, Self::RandomDraw { .. })
    }
}

/// One entry in a deck's draw sequence.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "SlotRepr")]
pub struct DeckSlot {
    #[serde(flatten)]
    pub reference: CardRef,

    #[serde(default)]
    pub starred: bool,
}

impl DeckSlot {
    #[must_use]
    pub fn new(reference: CardRef) -> Self {
        Self {
            reference,
            starred: false,
        }
    }

    /// Slot drawing a concrete card.
    #[must_use]
    pub fn card(card: impl Into<CardId>) -> Self {
        Self::new(CardRef::plain(card))
    }

    /// Slot drawing a random card from `deck`.
    #[must_use]
    pub fn random(deck: impl Into<DeckId>, finite: bool) -> Self {
        Self::new(CardRef::random(deck, finite))
    }

    #[must_use]
    pub fn starred(mut self) -> Self {
        self.starred = true;
        self
    }

    /// Parse the legacy string form.
    ///
    /// `SPECIAL:RANDOM:<deck>[:FINITE][:STARRED]` is a random draw, anything
    /// else is a card id with an optional `:STARRED` suffix.
    ///
    /// ```
    /// use rust_tabletop::cards::{CardRef, DeckSlot};
    ///
    /// let slot = DeckSlot::from_legacy("SPECIAL:RANDOM:d7:FINITE:STARRED");
    /// assert_eq!(slot.reference, CardRef::random("d7", true));
    /// assert!(slot.starred);
    /// ```
    #[must_use]
    pub fn from_legacy(encoded: &str) -> Self {
        let (body, starred) = match encoded.strip_suffix(LEGACY_STARRED) {
            Some(body) => (body, true),
            None => (encoded, false),
        };

        let reference = match body.strip_prefix(LEGACY_RANDOM) {
            Some(rest) => match rest.strip_suffix(LEGACY_FINITE) {
                Some(deck) => CardRef::random(deck, true),
                None => CardRef::random(rest, false),
            },
            None => CardRef::plain(body),
        };

        Self { reference, starred }
    }
}

#[derive(Deserialize)]
struct StructuredSlot {
    #[serde(flatten)]
    reference: CardRef,
    #[serde(default)]
    starred: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SlotRepr {
    Legacy(String),
    Structured(StructuredSlot),
}

impl From<SlotRepr> for DeckSlot {
    fn from(repr: SlotRepr) -> Self {
        match repr {
            SlotRepr::Legacy(encoded) => DeckSlot::from_legacy(&encoded),
            SlotRepr::Structured(s) => DeckSlot {
                reference: s.reference,
                starred: s.starred,
            },
        }
    }
}

/// Card orientation used when a deck and its cards are shown on the table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeckFormat {
    #[default]
    Vertical,
    Horizontal,
    Square,
}

/// Default deck color.
pub const DEFAULT_DECK_COLOR: &str = "#34495e";

fn default_color() -> String {
    DEFAULT_DECK_COLOR.to_string()
}

/// A stored deck definition.
///
/// ```
/// use rust_tabletop::cards::{Deck, DeckSlot};
///
/// let mut deck = Deck::new("d1", "Loot")
///     .with_slot(DeckSlot::card("c1"))
///     .with_slot(DeckSlot::card("c2"));
///
/// assert_eq!(deck.draw(), Some(DeckSlot::card("c1")));
/// assert_eq!(deck.len(), 1);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    pub id: DeckId,

    pub name: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// Handle used by `{HANDLE}` placeholders in card text.
    #[serde(default)]
    pub variable_handle: Option<String>,

    #[serde(default)]
    pub format: DeckFormat,

    /// Draw order, front first. Accepts the legacy `cardIds` key on import.
    #[serde(default, alias = "cardIds")]
    pub slots: Vec<DeckSlot>,
}

impl Deck {
    /// Create an empty deck with the default color.
    #[must_use]
    pub fn new(id: impl Into<DeckId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            color: default_color(),
            variable_handle: None,
            format: DeckFormat::default(),
            slots: Vec::new(),
        }
    }

    /// Create an empty deck with a freshly generated id.
    #[must_use]
    pub fn with_generated_id(name: impl Into<String>) -> Self {
        Self::new(DeckId::generate(), name)
    }

    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Set the variable handle. Handles are matched in upper case.
    #[must_use]
    pub fn with_handle(mut self, handle: impl Into<String>) -> Self {
        self.variable_handle = Some(handle.into().to_ascii_uppercase());
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: DeckFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn with_slot(mut self, slot: DeckSlot) -> Self {
        self.slots.push(slot);
        self
    }

    /// Append a plain card reference.
    pub fn add_card(&mut self, card: impl Into<CardId>) {
        self.slots.push(DeckSlot::card(card));
    }

    /// Remove the slot at `index`, if present.
    pub fn remove_at(&mut self, index: usize) -> Option<DeckSlot> {
        (index < self.slots.len()).then(|| self.slots.remove(index))
    }

    /// Remove the first plain reference to `card`. Returns whether one was found.
    pub fn remove_card(&mut self, card: &CardId) -> bool {
        let position = self
            .slots
            .iter()
            .position(|s| matches!(&s.reference, CardRef::Plain { card: c } if c == card));
        match position {
            Some(index) => {
                self.slots.remove(index);
                true
            }
            None => false,
        }
    }

    /// Remove and return the top slot.
    pub fn draw(&mut self) -> Option<DeckSlot> {
        if self.slots.is_empty() {
            return None;
        }
        Some(self.slots.remove(0))
    }

    /// Uniformly permute the draw order.
    pub fn shuffle(&mut self, rng: &mut impl Shuffler) {
        fisher_yates(&mut self.slots, rng);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Target decks of finite random-draw slots, in first-seen order, deduplicated.
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
}
