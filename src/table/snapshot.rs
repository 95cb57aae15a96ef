//! Persisted and exported table state.
//!
//! JSON shape:
//!
//! ```text
//! { "timestamp": ..., "tableState": { "decks": [...], "cards": [...],
//!   "pawns": [...], "resources": [...] },
//!   "definitions": { "cards": [...], "decks": [...] } }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::board::Table;
use crate::cards::{Card, Deck};

/// Stored definitions bundled with a snapshot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Definitions {
    #[serde(default)]
    pub cards: Vec<Card>,
    #[serde(default)]
    pub decks: Vec<Deck>,
}

/// A complete, self-contained picture of the table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSnapshot {
    pub timestamp: DateTime<Utc>,
    pub table_state: Table,
    #[serde(default)]
    pub definitions: Definitions,
}

impl TableSnapshot {
    #[must_use]
    pub fn new(table_state: Table, definitions: Definitions) -> Self {
        Self {
            timestamp: Utc::now(),
            table_state,
            definitions,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{DeckFormat, DeckSlot};
    use crate::core::{CardId, InstanceId};
    use crate::resolve::ResolutionContext;
    use crate::spatial::{Point, Size};
    use crate::table::TableCard;

    #[test]
    fn test_json_shape() {
        let mut resolution = ResolutionContext::new();
        resolution.insert("ITEM:0", CardId::from("sword"));

        let mut table = Table::new();
        table.cards.push(TableCard {
            id: InstanceId(4),
            card_id: CardId::from("hero"),
            position: Point::new(5.0, 6.0),
            size: Size::new(150.0, 210.0),
            z: 1004,
            color: "#123".into(),
            face_down: true,
            starred: false,
            format: DeckFormat::Square,
            source_name: "Heroes".into(),
            resolution,
        });
        let snapshot = TableSnapshot::new(
            table,
            Definitions {
                cards: vec![Card::new("hero", "Hero")],
                decks: vec![Deck::new("d", "Heroes").with_slot(DeckSlot::card("hero"))],
            },
        );

        let value: serde_json::Value = serde_json::from_str(&snapshot.to_json().unwrap()).unwrap();
        let card = &value["tableState"]["cards"][0];
        assert_eq!(card["faceDown"], true);
        assert_eq!(card["sourceName"], "Heroes");
        assert_eq!(card["resolution"][0][0], "ITEM:0");
        assert_eq!(card["resolution"][0][1], "sword");
        assert!(value["tableState"]["pawns"].as_array().unwrap().is_empty());
        assert_eq!(value["definitions"]["cards"][0]["name"], "Hero");

        let back = TableSnapshot::from_json(&snapshot.to_json().unwrap()).unwrap();
        assert_eq!(back, snapshot);
    }
}
