//! # rust-tabletop
//!
//! A headless virtual tabletop engine for custom card games.
//!
//! ## Design Principles
//!
//! 1. **Headless**: The drag engine reads and writes geometry through the
//!    `DragSurface` trait and never touches a rendering tree. Everything runs
//!    in tests.
//!
//! 2. **Definitions vs. Instances**: Stored cards and decks are never mutated
//!    by play. Placing a deck deep-copies it; draws shrink the copy only.
//!
//! 3. **Failures Are Values**: Resolution returns `Result`s classified by
//!    `Severity`. Only the table session turns them into notices.
//!
//! ## Architecture
//!
//! - **Drag Stack**: at drag start, every element above the pressed one
//!   that transitively covers more than half its own area moves with it.
//!
//! - **Special Cards**: deck slots may draw randomly from other decks, either
//!   from a shared depletable side deck (finite) or from the stored
//!   definition (infinite), behind a recursion depth guard.
//!
//! - **Text Variables**: `{HANDLE}` / `{HANDLE:INDEX}` placeholders draw
//!   from the table deck carrying that handle; results are cached per card
//!   instance and persisted with it.
//!
//! ## Modules
//!
//! - `core`: IDs, RNG, z-order, configuration, errors
//! - `spatial`: geometry and overlap tests
//! - `cards`: card and deck definitions, library helpers
//! - `resolve`: special-card resolution and text substitution
//! - `drag`: drag, stack and snap engine
//! - `table`: live table instances, snapshots and the session
//! - `store`: entity store over key-value backends

pub mod core;
pub mod spatial;
pub mod cards;
pub mod resolve;
pub mod drag;
pub mod table;
pub mod store;

// Re-export commonly used types
pub use crate::core::{
    CardId, DeckId, InstanceId,
    Shuffler, TableRng, SequenceShuffler,
    ZOrderAllocator, TableConfig,
    ResolveError, Severity, StoreError, TableError,
};

pub use crate::spatial::{Point, Rect, Size, Viewport, Positioned, overlap_ratio, overlaps, significant_overlap};

pub use crate::cards::{Card, CardRef, Deck, DeckFormat, DeckSlot, CardRegistry, DeckRegistry};

pub use crate::resolve::{
    CardResolver, DrawContext, DrawSource, ResolvedCard,
    ResolutionContext, RenderedText, TextSegment, VariableEngine,
};

pub use crate::drag::{
    DragEngine, DragEvent, DragPhase, DragSurface,
    ElementKind, ElementView, Selection,
    compute_drag_group, compute_selection,
};

pub use crate::table::{
    Table, TableCard, TableDeck, TablePawn, TableResource, PawnShape,
    TableSnapshot, TableSession, SideDeckLink, Notice, RenderedCard,
};

pub use crate::store::{EntityStore, RecordStore, MemoryBackend, FileBackend, KeyValueBackend};
