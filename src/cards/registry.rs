//! In-memory lookup of stored definitions.
//!
//! `CardRegistry` indexes cards by id and by display number;
//! `DeckRegistry` indexes decks by id and keeps their library order.
//! The table session loads both from the entity store.

use rustc_hash::FxHashMap;

use super::deck::Deck;
use super::definition::Card;
use crate::core::{CardId, DeckId};

/// Card definitions keyed by id and display number.
///
/// ```
/// use rust_tabletop::cards::{Card, CardRegistry};
/// use rust_tabletop::core::CardId;
///
/// let mut registry = CardRegistry::new();
/// registry.insert(Card::new("c1", "Goblin").with_display_id(7));
///
/// assert_eq!(registry.get(&CardId::from("c1")).unwrap().name, "Goblin");
/// assert_eq!(registry.get_by_display_id(7).unwrap().id, CardId::from("c1"));
/// ```
#[derive(Clone, Debug, Default)]
pub struct CardRegistry {
    cards: FxHashMap<CardId, Card>,
    by_display: FxHashMap<u32, CardId>,
}

impl CardRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a list of cards. Later duplicates win.
    #[must_use]
    pub fn from_cards(cards: impl IntoIterator<Item = Card>) -> Self {
        let mut registry = Self::new();
        for card in cards {
            registry.insert(card);
        }
        registry
    }

    /// Insert or replace a card. Returns the previous definition.
    pub fn insert(&mut self, card: Card) -> Option<Card> {
        let previous = self.cards.remove(&card.id);
        if let Some(display) = previous.as_ref().and_then(|p| p.display_id) {
            self.by_display.remove(&display);
        }
        if let Some(display) = card.display_id {
            self.by_display.insert(display, card.id.clone());
        }
        self.cards.insert(card.id.clone(), card);
        previous
    }

    /// Remove a card by id.
    pub fn remove(&mut self, id: &CardId) -> Option<Card> {
        let card = self.cards.remove(id)?;
        if let Some(display) = card.display_id {
            self.by_display.remove(&display);
        }
        Some(card)
    }

    #[must_use]
    pub fn get(&self, id: &CardId) -> Option<&Card> {
        self.cards.get(id)
    }

    /// Look a card up by its human-facing number.
    #[must_use]
    pub fn get_by_display_id(&self, display_id: u32) -> Option<&Card> {
        self.by_display.get(&display_id).and_then(|id| self.cards.get(id))
    }

    #[must_use]
    pub fn contains(&self, id: &CardId) -> bool {
        self.cards.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Iterate over all cards (arbitrary order).
    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.cards.values()
    }

    /// Highest display number in use, 0 when none.
    #[must_use]
    pub fn max_display_id(&self) -> u32 {
        self.by_display.keys().copied().max().unwrap_or(0)
    }
}

/// Deck definitions in library order.
#[derive(Clone, Debug, Default)]
pub struct DeckRegistry {
    decks: Vec<Deck>,
    index: FxHashMap<DeckId, usize>,
}

impl DeckRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_decks(decks: impl IntoIterator<Item = Deck>) -> Self {
        let mut registry = Self::new();
        for deck in decks {
            registry.insert(deck);
        }
        registry
    }

    /// Insert or replace a deck, keeping its position when replacing.
    pub fn insert(&mut self, deck: Deck) {
        match self.index.get(&deck.id) {
            Some(&i) => self.decks[i] = deck,
            None => {
                self.index.insert(deck.id.clone(), self.decks.len());
                self.decks.push(deck);
            }
        }
    }

    pub fn remove(&mut self, id: &DeckId) -> Option<Deck> {
        let i = self.index.remove(id)?;
        let deck = self.decks.remove(i);
        for slot in self.index.values_mut() {
            if *slot > i {
                *slot -= 1;
            }
        }
        Some(deck)
    }

    #[must_use]
    pub fn get(&self, id: &DeckId) -> Option<&Deck> {
        self.index.get(id).map(|&i| &self.decks[i])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.decks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.decks.is_empty()
    }

    /// Iterate in library order.
    pub fn iter(&self) -> impl Iterator<Item = &Deck> {
        self.decks.iter()
    }
}
