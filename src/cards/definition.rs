//! Card definitions - stored card data.
//!
//! A `Card` is what the library editor saves: name, texts and tags. Table
//! play never mutates it; a card on the table is a `TableCard` pointing
//! back at a definition by id.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::CardId;

/// Tag list, usually a handful of short labels.
pub type Tags = SmallVec<[String; 4]>;

/// A stored card definition.
///
/// `display_id` is the human-facing sequence number. It is assigned by
/// the entity store on first save and never reused.
///
/// ```
/// use rust_tabletop::cards::Card;
///
/// let card = Card::new("c1", "Goblin")
///     .with_mechanical_text("Deals {DMG} damage.")
///     .with_tag("monster");
///
/// assert_eq!(card.name, "Goblin");
/// assert!(card.has_tag("Monster"));
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: CardId,

    #[serde(default)]
    pub display_id: Option<u32>,

    pub name: String,

    #[serde(default)]
    pub mechanical_text: String,

    #[serde(default)]
    pub flavor_text: String,

    #[serde(default)]
    pub tags: Tags,
}

impl Card {
    /// Create a card with empty texts and no display number.
    #[must_use]
    pub fn new(id: impl Into<CardId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_id: None,
            name: name.into(),
            mechanical_text: String::new(),
            flavor_text: String::new(),
            tags: Tags::new(),
        }
    }

    /// Create a card with a freshly generated id.
    #[must_use]
    pub fn with_generated_id(name: impl Into<String>) -> Self {
        Self::new(CardId::generate(), name)
    }

    #[must_use]
    pub fn with_mechanical_text(mut self, text: impl Into<String>) -> Self {
        self.mechanical_text = text.into();
        self
    }

    #[must_use]
    pub fn with_flavor_text(mut self, text: impl Into<String>) -> Self {
        self.flavor_text = text.into();
        self
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    #[must_use]
    pub fn with_display_id(mut self, display_id: u32) -> Self {
        self.display_id = Some(display_id);
        self
    }

    /// Case-insensitive exact tag match.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}
