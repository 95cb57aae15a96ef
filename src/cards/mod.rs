//! Card system: stored definitions, decks and library helpers.
//!
//! ## Key Types
//!
//! - `Card`: stored card definition (name, texts, tags, display number)
//! - `Deck`: stored deck definition, an ordered list of `DeckSlot`s
//! - `CardRef`: what a slot draws (plain card or random draw)
//! - `CardRegistry` / `DeckRegistry`: definition lookup

pub mod definition;
pub mod deck;
pub mod registry;
pub mod library;

pub use definition::{Card, Tags};
pub use deck::{CardRef, Deck, DeckFormat, DeckSlot, DEFAULT_DECK_COLOR};
pub use registry::{CardRegistry, DeckRegistry};
pub use library::{migrate_display_ids, parse_bulk_import, parse_display_ids, search};
