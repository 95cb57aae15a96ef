//! Core engine types: identities, RNG, z-order, configuration, errors.
//!
//! Everything here is independent of the table layout and the card text
//! engines; the other modules build on these.

pub mod ids;
pub mod rng;
pub mod zorder;
pub mod config;
pub mod error;

pub use ids::{CardId, DeckId, InstanceId};
pub use rng::{fisher_yates, fisher_yates_vector, SequenceShuffler, Shuffler, TableRng};
pub use zorder::ZOrderAllocator;
pub use config::TableConfig;
pub use error::{ResolveError, Severity, StoreError, TableError};
