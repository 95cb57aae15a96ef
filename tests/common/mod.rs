//! Shared helpers for the integration tests.
//!
//! Set `TEST_LOG=debug` (or `RUST_LOG`) to see engine logs.

#![allow(dead_code)]

use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

use rust_tabletop::cards::{Card, Deck, DeckSlot};
use rust_tabletop::core::{SequenceShuffler, TableConfig};
use rust_tabletop::store::{EntityStore, MemoryBackend, RecordStore};
use rust_tabletop::table::TableSession;

static INITIALIZED: OnceCell<()> = OnceCell::new();

/// Install a test subscriber once per test binary.
pub fn init_logging() {
    INITIALIZED.get_or_init(|| {
        let filter = std::env::var("TEST_LOG")
            .or_else(|_| std::env::var("RUST_LOG"))
            .map(EnvFilter::new)
            .unwrap_or_else(|_| EnvFilter::new("warn"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .without_time()
            .try_init()
            .ok();
    });
}

pub type TestSession = TableSession<RecordStore<MemoryBackend>, SequenceShuffler>;

/// A small library:
///
/// - cards `hero`, `sword`, `shield`, `potion`, `goblin`
/// - `heroes`: [hero]
/// - `gear` (handle `ITEM`): [sword, shield, potion]
/// - `loot`: [finite random draw from gear, potion]
/// - `monsters`: [infinite random draw from gear, goblin]
pub fn library_store() -> RecordStore<MemoryBackend> {
    let mut store = RecordStore::in_memory();
    for card in [
        Card::new("hero", "Hero")
            .with_mechanical_text("Wields {ITEM} and {ITEM:1}.")
            .with_flavor_text("Never without {ITEM}.")
            .with_tag("character"),
        Card::new("sword", "Sword").with_tag("weapon"),
        Card::new("shield", "Shield").with_tag("armor"),
        Card::new("potion", "Potion").with_tag("consumable"),
        Card::new("goblin", "Goblin").with_tag("monster"),
    ] {
        store.save_card(card).unwrap();
    }

    for deck in [
        Deck::new("heroes", "Heroes").with_slot(DeckSlot::card("hero")),
        Deck::new("gear", "Gear")
            .with_color("#aa8800")
            .with_handle("item")
            .with_slot(DeckSlot::card("sword"))
            .with_slot(DeckSlot::card("shield"))
            .with_slot(DeckSlot::card("potion")),
        Deck::new("loot", "Loot")
            .with_slot(DeckSlot::random("gear", true))
            .with_slot(DeckSlot::card("potion")),
        Deck::new("monsters", "Monsters")
            .with_slot(DeckSlot::random("gear", false))
            .with_slot(DeckSlot::card("goblin")),
    ] {
        store.save_deck(deck).unwrap();
    }
    store
}

/// Session over [`library_store`] with a scripted shuffler that always
/// answers 0, so shuffles and random draws are predictable.
pub fn session() -> TestSession {
    init_logging();
    TableSession::with_rng(library_store(), TableConfig::default(), SequenceShuffler::default())
        .unwrap()
}
