//! Persistence of definitions and table snapshots.
//!
//! ## Key Types
//!
//! - `EntityStore`: the store contract the table session consumes
//! - `RecordStore`: JSON records over any `KeyValueBackend`
//! - `MemoryBackend`, `FileBackend`: volatile and directory-backed storage

pub mod backend;
pub mod record;

pub use backend::{FileBackend, KeyValueBackend, MemoryBackend};
pub use record::{
    DeckBundle, EntityStore, LibraryBundle, RecordStore, CARDS_KEY, DECKS_KEY, TABLE_KEY,
};
