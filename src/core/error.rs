//! Error types shared across the table engine.
//!
//! Nothing here is fatal to a session. Each variant maps to one class of
//! the failure taxonomy via [`Severity`]; the table session is the only
//! layer that turns failures into user-visible notices.

use thiserror::Error;

use super::ids::{CardId, DeckId, InstanceId};

/// How a failure should be surfaced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    /// Render as-is, no interruption (unresolved placeholder).
    Silent,
    /// Abort the triggering action and show a transient notice.
    Notified,
    /// A recursion guard tripped; abort this one draw and notify.
    Guarded,
    /// Stale data referencing something that no longer exists; skip.
    Orphaned,
}

/// Failure while resolving a drawn reference into a concrete card.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("card {0} not found in definitions")]
    CardNotFound(CardId),

    #[error("random draw target deck {0} not found")]
    TargetDeckMissing(DeckId),

    #[error("random draw target deck {0} is empty")]
    TargetDeckEmpty(DeckId),

    #[error("no side deck on the table for deck {0}")]
    SideDeckMissing(DeckId),

    #[error("side deck for deck {0} is empty")]
    SideDeckEmpty(DeckId),

    #[error("special card recursion exceeded depth {0}")]
    DepthExceeded(u8),

    #[error("random draw from deck {0} landed on another special card (recursion not supported)")]
    NestedSpecialUnsupported(DeckId),
}

impl ResolveError {
    /// Classify this failure.
    #[must_use]
    pub fn severity(&self) -> Severity {
        match self {
            Self::CardNotFound(_) => Severity::Orphaned,
            Self::TargetDeckMissing(_)
            | Self::TargetDeckEmpty(_)
            | Self::SideDeckMissing(_)
            | Self::SideDeckEmpty(_) => Severity::Notified,
            Self::DepthExceeded(_) | Self::NestedSpecialUnsupported(_) => Severity::Guarded,
        }
    }
}

/// Failure in the entity store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to encode or decode record: {0}")]
    Json(#[from] serde_json::Error),

    #[error("storage backend I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of a table action.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("no table element {0}")]
    UnknownInstance(InstanceId),

    #[error("deck {0} is not in the library")]
    UnknownDeck(DeckId),

    #[error("card {0} is not in the library")]
    UnknownCard(CardId),

    #[error("deck is empty")]
    DeckEmpty,

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
