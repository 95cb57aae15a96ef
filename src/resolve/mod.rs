//! Card resolution and text substitution.
//!
//! ## Key Types
//!
//! - `CardResolver`: resolves a drawn slot (plain or random draw) into a
//!   concrete card, with a depth guard against special-card cycles
//! - `VariableEngine`: expands `{HANDLE}` / `{HANDLE:INDEX}` placeholders
//!   by drawing from table decks
//! - `ResolutionContext`: per-card-instance cache of placeholder results
//! - `DrawSource`: the definitions and live decks the resolvers draw from
//!
//! ## Example
//!
//! ```
//! use rust_tabletop::cards::DeckSlot;
//! use rust_tabletop::core::{ResolveError, SequenceShuffler};
//! use rust_tabletop::resolve::{CardResolver, DrawContext, DrawSource};
//! # use rust_tabletop::cards::{Card, Deck};
//! # use rust_tabletop::core::{CardId, DeckId};
//! # use rust_tabletop::table::TableDeck;
//! # struct Empty;
//! # impl DrawSource for Empty {
//! #     fn card(&self, _: &CardId) -> Option<&Card> { None }
//! #     fn stored_deck(&self, _: &DeckId) -> Option<&Deck> { None }
//! #     fn side_deck_mut(&mut self, _: &DeckId) -> Option<&mut TableDeck> { None }
//! #     fn deck_by_handle_mut(&mut self, _: &str) -> Option<&mut TableDeck> { None }
//! # }
//!
//! let ctx = DrawContext {
//!     depth: 0,
//!     color: "#000".into(),
//!     face_down: false,
//!     starred: false,
//!     source_name: "Deck".into(),
//!     format: Default::default(),
//! };
//! let result = CardResolver::default().resolve_draw(
//!     &DeckSlot::random("elsewhere", true),
//!     &ctx,
//!     &mut Empty,
//!     &mut SequenceShuffler::default(),
//! );
//! assert!(matches!(result, Err(ResolveError::SideDeckMissing(_))));
//! ```

pub mod context;
pub mod draw;
pub mod variables;

pub use context::ResolutionContext;
pub use draw::{CardResolver, DrawContext, DrawSource, ResolvedCard};
pub use variables::{RenderedText, Substituted, TextSegment, VariableEngine};
