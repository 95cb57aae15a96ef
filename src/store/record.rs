//! The entity store: card and deck definitions plus the table snapshot.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::backend::{KeyValueBackend, MemoryBackend};
use crate::cards::{Card, Deck};
use crate::core::{CardId, DeckId, StoreError};
use crate::table::TableSnapshot;

pub const CARDS_KEY: &str = "card_system_cards";
pub const DECKS_KEY: &str = "card_system_decks";
pub const TABLE_KEY: &str = "card_system_table";

/// Exported card library.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LibraryBundle {
    #[serde(default)]
    pub cards: Vec<Card>,
}

/// Exported deck collection.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DeckBundle {
    #[serde(default)]
    pub decks: Vec<Deck>,
}

/// Persistence of definitions and the table snapshot.
pub trait EntityStore {
    fn get_cards(&self) -> Result<Vec<Card>, StoreError>;

    /// Insert or update. New cards get the next display number; updates
    /// keep the stored number unless the incoming card carries one.
    fn save_card(&mut self, card: Card) -> Result<Card, StoreError>;

    /// Returns whether a card was removed.
    fn delete_card(&mut self, id: &CardId) -> Result<bool, StoreError>;

    fn get_decks(&self) -> Result<Vec<Deck>, StoreError>;

    fn save_deck(&mut self, deck: Deck) -> Result<(), StoreError>;

    fn delete_deck(&mut self, id: &DeckId) -> Result<bool, StoreError>;

    fn get_table_state(&self) -> Result<Option<TableSnapshot>, StoreError>;

    fn save_table_state(&mut self, snapshot: &TableSnapshot) -> Result<(), StoreError>;

    fn export_library(&self) -> Result<LibraryBundle, StoreError> {
        Ok(LibraryBundle {
            cards: self.get_cards()?,
        })
    }

    /// Save every card in the bundle, returning how many were processed.
    fn import_library(&mut self, bundle: LibraryBundle) -> Result<usize, StoreError> {
        let count = bundle.cards.len();
        for card in bundle.cards {
            self.save_card(card)?;
        }
        Ok(count)
    }

    fn export_decks(&self) -> Result<DeckBundle, StoreError> {
        Ok(DeckBundle {
            decks: self.get_decks()?,
        })
    }

    fn import_decks(&mut self, bundle: DeckBundle) -> Result<usize, StoreError> {
        let count = bundle.decks.len();
        for deck in bundle.decks {
            self.save_deck(deck)?;
        }
        Ok(count)
    }
}

/// [`EntityStore`] over a [`KeyValueBackend`], one JSON record per key.
///
/// Cards, decks and the table are separate keys, so a crash between two
/// saves can leave them out of step.
#[derive(Clone, Debug, Default)]
pub struct RecordStore<B: KeyValueBackend = MemoryBackend> {
    backend: B,
}

impl RecordStore<MemoryBackend> {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }
}

impl<B: KeyValueBackend> RecordStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Drop all card and deck records. The table snapshot is kept.
    pub fn clear_all(&mut self) -> Result<(), StoreError> {
        self.backend.remove(CARDS_KEY)?;
        self.backend.remove(DECKS_KEY)
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.backend.get(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn write<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<(), StoreError> {
        let raw = serde_json::to_string(value)?;
        self.backend.set(key, raw)
    }
}

impl<B: KeyValueBackend> EntityStore for RecordStore<B> {
    fn get_cards(&self) -> Result<Vec<Card>, StoreError> {
        Ok(self.read(CARDS_KEY)?.unwrap_or_default())
    }

    fn save_card(&mut self, mut card: Card) -> Result<Card, StoreError> {
        let mut cards = self.get_cards()?;
        match cards.iter().position(|c| c.id == card.id) {
            Some(index) => {
                if card.display_id.is_none() {
                    card.display_id = cards[index].display_id;
                }
                cards[index] = card.clone();
            }
            None => {
                let max = cards.iter().filter_map(|c| c.display_id).max().unwrap_or(0);
                card.display_id = Some(max + 1);
                cards.push(card.clone());
            }
        }
        debug!(card = %card.id, display_id = ?card.display_id, "card saved");
        self.write(CARDS_KEY, &cards)?;
        Ok(card)
    }

    fn delete_card(&mut self, id: &CardId) -> Result<bool, StoreError> {
        let mut cards = self.get_cards()?;
        let before = cards.len();
        cards.retain(|c| &c.id != id);
        let removed = cards.len() != before;
        if removed {
            self.write(CARDS_KEY, &cards)?;
        }
        Ok(removed)
    }

    fn get_decks(&self) -> Result<Vec<Deck>, StoreError> {
        Ok(self.read(DECKS_KEY)?.unwrap_or_default())
    }

    fn save_deck(&mut self, deck: Deck) -> Result<(), StoreError> {
        let mut decks = self.get_decks()?;
        match decks.iter_mut().find(|d| d.id == deck.id) {
            Some(existing) => *existing = deck,
            None => decks.push(deck),
        }
        self.write(DECKS_KEY, &decks)
    }

    fn delete_deck(&mut self, id: &DeckId) -> Result<bool, StoreError> {
        let mut decks = self.get_decks()?;
        let before = decks.len();
        decks.retain(|d| &d.id != id);
        let removed = decks.len() != before;
        if removed {
            self.write(DECKS_KEY, &decks)?;
        }
        Ok(removed)
    }

    fn get_table_state(&self) -> Result<Option<TableSnapshot>, StoreError> {
        self.read(TABLE_KEY)
    }

    fn save_table_state(&mut self, snapshot: &TableSnapshot) -> Result<(), StoreError> {
        self.write(TABLE_KEY, snapshot)
    }
}
