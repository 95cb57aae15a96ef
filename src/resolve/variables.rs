//! Placeholder substitution in card text.
//!
//! Card text may contain `{HANDLE}` or `{HANDLE:INDEX}` tokens. Each
//! distinct token draws one card from the table deck whose variable
//! handle is `HANDLE`, and the result is cached in the card instance's
//! [`ResolutionContext`] under `HANDLE:INDEX` (index defaults to 0).
//!
//! Unresolvable tokens (no such deck on the table, deck empty) are left
//! in the text literally.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use super::context::ResolutionContext;
use super::draw::{CardResolver, DrawContext, DrawSource};
use crate::core::{CardId, ResolveError, Shuffler};

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([A-Z0-9_]+)(?::(\d+))?\}").expect("placeholder pattern is valid")
});

/// A piece of rendered card text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TextSegment {
    /// Literal text, including placeholders left unresolved.
    Text(String),

    /// A resolved placeholder: clicking it spawns a copy of `card`.
    Reference {
        key: String,
        card: CardId,
        label: String,
    },
}

/// Card text after substitution.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderedText {
    pub segments: Vec<TextSegment>,
}

impl RenderedText {
    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(TextSegment::Text(last)) = self.segments.last_mut() {
            last.push_str(text);
        } else {
            self.segments.push(TextSegment::Text(text.to_string()));
        }
    }

    /// The text with each reference replaced by its label.
    #[must_use]
    pub fn plain(&self) -> String {
        self.segments
            .iter()
            .map(|s| match s {
                TextSegment::Text(t) => t.as_str(),
                TextSegment::Reference { label, .. } => label.as_str(),
            })
            .collect()
    }

    /// Referenced cards, in text order.
    pub fn references(&self) -> impl Iterator<Item = &CardId> {
        self.segments.iter().filter_map(|s| match s {
            TextSegment::Reference { card, .. } => Some(card),
            TextSegment::Text(_) => None,
        })
    }
}

impl std::fmt::Display for RenderedText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.plain())
    }
}

/// Outcome of substituting one text field.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Substituted {
    pub text: RenderedText,

    /// Draws that were attempted but failed to resolve.
    pub failures: Vec<ResolveError>,
}

/// Expands placeholders against the decks on the table.
#[derive(Clone, Copy, Debug)]
pub struct VariableEngine {
    resolver: CardResolver,
    max_text_depth: u8,
}

impl Default for VariableEngine {
    fn default() -> Self {
        Self {
            resolver: CardResolver::default(),
            max_text_depth: 5,
        }
    }
}

impl VariableEngine {
    #[must_use]
    pub fn new(resolver: CardResolver, max_text_depth: u8) -> Self {
        Self {
            resolver,
            max_text_depth,
        }
    }

    /// Substitute every placeholder in `text`.
    ///
    /// Tokens already present in `ctx` reuse the cached card; new tokens
    /// draw from the matching table deck and are cached. Pass the same
    /// `ctx` for every text field of one card instance.
    pub fn substitute<S, R>(
        &self,
        text: &str,
        ctx: &mut ResolutionContext,
        source: &mut S,
        rng: &mut R,
    ) -> Substituted
    where
        S: DrawSource + ?Sized,
        R: Shuffler + ?Sized,
    {
        let mut failures = Vec::new();
        let text = self.expand(text, &mut Vec::new(), ctx, source, rng, &mut failures);
        Substituted { text, failures }
    }

    /// `path` holds the keys whose card names are being expanded, outermost
    /// first. Its length is the nesting depth.
    fn expand<S, R>(
        &self,
        text: &str,
        path: &mut Vec<String>,
        ctx: &mut ResolutionContext,
        source: &mut S,
        rng: &mut R,
        failures: &mut Vec<ResolveError>,
    ) -> RenderedText
    where
        S: DrawSource + ?Sized,
        R: Shuffler + ?Sized,
    {
        let mut rendered = RenderedText::default();
        if path.len() > usize::from(self.max_text_depth) {
            rendered.push_text(text);
            return rendered;
        }

        let mut last = 0;
        for caps in PLACEHOLDER.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            rendered.push_text(&text[last..whole.start()]);
            last = whole.end();

            let handle = &caps[1];
            let index = match caps.get(2) {
                Some(m) => match m.as_str().parse::<u32>() {
                    Ok(index) => index,
                    Err(_) => {
                        rendered.push_text(whole.as_str());
                        continue;
                    }
                },
                None => 0,
            };
            let key = ResolutionContext::key(handle, index);
            // A name never expands the placeholder it was drawn for.
            if path.contains(&key) {
                rendered.push_text(whole.as_str());
                continue;
            }

            match self.lookup_or_draw(&key, handle, ctx, source, rng, failures) {
                Some((card, name)) => {
                    path.push(key.clone());
                    let label = self.expand(&name, path, ctx, source, rng, failures).plain();
                    path.pop();
                    rendered.segments.push(TextSegment::Reference { key, card, label });
                }
                None => rendered.push_text(whole.as_str()),
            }
        }
        rendered.push_text(&text[last..]);
        rendered
    }

    /// Find the cached card for `key`, or draw and cache a new one.
    ///
    /// Returns the card id and its name, or `None` to leave the token literal.
    fn lookup_or_draw<S, R>(
        &self,
        key: &str,
        handle: &str,
        ctx: &mut ResolutionContext,
        source: &mut S,
        rng: &mut R,
        failures: &mut Vec<ResolveError>,
    ) -> Option<(CardId, String)>
    where
        S: DrawSource + ?Sized,
        R: Shuffler + ?Sized,
    {
        if let Some(cached) = ctx.get(key) {
            return match source.card(cached) {
                Some(card) => Some((card.id.clone(), card.name.clone())),
                None => {
                    debug!(key, card = %cached, "cached placeholder card no longer exists");
                    None
                }
            };
        }

        let deck = source.deck_by_handle_mut(handle)?;
        let slot = deck.draw()?;
        let draw_ctx = DrawContext::from_table_deck(deck);

        match self.resolver.resolve_draw(&slot, &draw_ctx, source, rng) {
            Ok(resolved) => {
                debug!(key, card = %resolved.card.id, "placeholder resolved");
                ctx.insert(key, resolved.card.id.clone());
                Some((resolved.card.id, resolved.card.name))
            }
            Err(err) => {
                warn!(key, error = %err, "placeholder draw failed");
                failures.push(err);
                None
            }
        }
    }
}
