//! Per-instance placeholder cache.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::CardId;

/// Maps placeholder keys (`HANDLE:INDEX`) to the card they resolved to.
///
/// Each card instance on the table owns one. It is consulted before any
/// new draw, so `{ITEM:1}` keeps resolving to the same card across
/// sibling text fields, re-renders and save/load cycles. It serializes
/// as an array of `[key, cardId]` pairs.
///
/// ```
/// use rust_tabletop::resolve::ResolutionContext;
/// use rust_tabletop::core::CardId;
///
/// let mut ctx = ResolutionContext::new();
/// ctx.insert("ITEM:0", CardId::from("c1"));
///
/// let json = serde_json::to_string(&ctx).unwrap();
/// assert_eq!(json, r#"[["ITEM:0","c1"]]"#);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<(String, CardId)>", into = "Vec<(String, CardId)>")]
pub struct ResolutionContext {
    entries: BTreeMap<String, CardId>,
}

impl ResolutionContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the cache key for a placeholder.
    #[must_use]
    pub fn key(handle: &str, index: u32) -> String {
        format!("{handle}:{index}")
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&CardId> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, card: CardId) {
        self.entries.insert(key.into(), card);
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CardId)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Drop entries whose card no longer exists. Returns how many were dropped.
    pub fn retain_cards(&mut self, mut exists: impl FnMut(&CardId) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, card| exists(card));
        before - self.entries.len()
    }
}

impl From<Vec<(String, CardId)>> for ResolutionContext {
    fn from(pairs: Vec<(String, CardId)>) -> Self {
        Self {
            entries: pairs.into_iter().collect(),
        }
    }
}

impl From<ResolutionContext> for Vec<(String, CardId)> {
    fn from(ctx: ResolutionContext) -> Self {
        ctx.entries.into_iter().collect()
    }
}
