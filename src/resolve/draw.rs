//! Card resolution - turning a drawn slot into a concrete card.
//!
//! A slot is either a plain card id or a random draw from another deck.
//! Random draws come in two flavours:
//!
//! - **Finite**: shift the top slot off the target's side deck on the
//!   table. The side deck is shared by every finite reference to the same
//!   target, so repeated draws deplete it.
//! - **Infinite**: sample a slot uniformly from the stored target deck
//!   without mutating it.
//!
//! The inner slot is resolved recursively. A depth counter stops special
//! reference cycles (deck A draws from B which draws from A).

use tracing::debug;

use crate::cards::{Card, CardRef, Deck, DeckFormat, DeckSlot};
use crate::core::{CardId, DeckId, ResolveError, Shuffler};
use crate::table::TableDeck;

/// Everything the resolvers need to read or draw from.
///
/// The table session implements this over its registries and live table;
/// tests implement it over plain collections.
pub trait DrawSource {
    /// Stored card definition.
    fn card(&self, id: &CardId) -> Option<&Card>;

    /// Stored deck definition.
    fn stored_deck(&self, id: &DeckId) -> Option<&Deck>;

    /// The live side deck spawned for `target`, if one is on the table.
    fn side_deck_mut(&mut self, target: &DeckId) -> Option<&mut TableDeck>;

    /// The live table deck answering `{handle}` placeholders.
    fn deck_by_handle_mut(&mut self, handle: &str) -> Option<&mut TableDeck>;
}

/// Display attributes inherited down a chain of indirections.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawContext {
    /// Number of indirections followed so far.
    pub depth: u8,
    pub color: String,
    pub face_down: bool,
    pub starred: bool,
    pub source_name: String,
    pub format: DeckFormat,
}

impl DrawContext {
    /// Context for a top-level draw from a deck on the table.
    #[must_use]
    pub fn from_table_deck(deck: &TableDeck) -> Self {
        Self {
            depth: 0,
            color: deck.color.clone(),
            face_down: false,
            starred: false,
            source_name: deck.name.clone(),
            format: deck.format,
        }
    }

    #[must_use]
    pub fn face_down(mut self, face_down: bool) -> Self {
        self.face_down = face_down;
        self
    }

    /// Step one indirection deeper, taking display attributes from the
    /// deck the card is actually drawn from.
    fn descend(&self, name: &str, color: &str, format: DeckFormat, starred: bool) -> Self {
        Self {
            depth: self.depth + 1,
            color: color.to_string(),
            face_down: self.face_down,
            starred,
            source_name: name.to_string(),
            format,
        }
    }
}

/// A concrete card plus the display attributes it inherited.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedCard {
    pub card: Card,
    pub color: String,
    pub face_down: bool,
    pub starred: bool,
    pub source_name: String,
    pub format: DeckFormat,
}

/// Resolves drawn slots with a recursion guard.
#[derive(Clone, Copy, Debug)]
pub struct CardResolver {
    max_depth: u8,
}

impl Default for CardResolver {
    fn default() -> Self {
        Self { max_depth: 10 }
    }
}

impl CardResolver {
    #[must_use]
    pub fn new(max_depth: u8) -> Self {
        Self { max_depth }
    }

    #[must_use]
    pub fn max_depth(&self) -> u8 {
        self.max_depth
    }

    /// Resolve a drawn slot into a concrete card.
    ///
    /// The starred flag of any slot along the chain sticks to the result.
    /// Display color, name and format come from the deck the concrete card
    /// was finally drawn from.
    pub fn resolve_draw<S, R>(
        &self,
        slot: &DeckSlot,
        ctx: &DrawContext,
        source: &mut S,
        rng: &mut R,
    ) -> Result<ResolvedCard, ResolveError>
    where
        S: DrawSource + ?Sized,
        R: Shuffler + ?Sized,
    {
        if ctx.depth > self.max_depth {
            return Err(ResolveError::DepthExceeded(self.max_depth));
        }

        let starred = ctx.starred || slot.starred;

        match &slot.reference {
            CardRef::Plain { card } => {
                let card = source
                    .card(card)
                    .ok_or_else(|| ResolveError::CardNotFound(card.clone()))?;
                Ok(ResolvedCard {
                    card: card.clone(),
                    color: ctx.color.clone(),
                    face_down: ctx.face_down,
                    starred,
                    source_name: ctx.source_name.clone(),
                    format: ctx.format,
                })
            }

            CardRef::RandomDraw { deck, finite: true } => {
                let side = source
                    .side_deck_mut(deck)
                    .ok_or_else(|| ResolveError::SideDeckMissing(deck.clone()))?;
                let inner = side
                    .draw()
                    .ok_or_else(|| ResolveError::SideDeckEmpty(deck.clone()))?;
                let next = ctx.descend(&side.name, &side.color, side.format, starred);

                debug!(target_deck = %deck, depth = next.depth, remaining = side.len(), "finite random draw");
                self.resolve_draw(&inner, &next, source, rng)
            }

            CardRef::RandomDraw { deck, finite: false } => {
                let stored = source
                    .stored_deck(deck)
                    .ok_or_else(|| ResolveError::TargetDeckMissing(deck.clone()))?;
                if stored.is_empty() {
                    return Err(ResolveError::TargetDeckEmpty(deck.clone()));
                }
                let inner = stored.slots[rng.next_index(stored.len())].clone();
                if inner.reference.is_special() {
                    return Err(ResolveError::NestedSpecialUnsupported(deck.clone()));
                }
                let next = ctx.descend(&stored.name, &stored.color, stored.format, starred);

                debug!(target_deck = %deck, depth = next.depth, "infinite random draw");
                self.resolve_draw(&inner, &next, source, rng)
            }
        }
    }
}
