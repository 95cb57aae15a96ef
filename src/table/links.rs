//! Deck-to-side-deck connections.

use serde::{Deserialize, Serialize};

use super::board::Table;
use crate::core::InstanceId;
use crate::spatial::{Point, Positioned};

/// A source deck visually tied to the side deck its finite random
/// references draw from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SideDeckLink {
    pub source: InstanceId,
    pub side: InstanceId,
}

/// A line to draw between two deck centers, in table coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConnectorLine {
    pub link: SideDeckLink,
    pub from: Point,
    pub to: Point,
}

/// Current endpoints of every link whose decks are both on the table.
///
/// Reads live positions only, so calling it every frame is harmless.
#[must_use]
pub fn connector_lines(table: &Table, links: &[SideDeckLink]) -> Vec<ConnectorLine> {
    links
        .iter()
        .filter_map(|link| {
            let source = table.deck(link.source)?;
            let side = table.deck(link.side)?;
            Some(ConnectorLine {
                link: *link,
                from: source.rect().center(),
                to: side.rect().center(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::Deck;
    use crate::spatial::Size;
    use crate::table::TableDeck;

    #[test]
    fn test_lines_follow_positions() {
        let mut table = Table::new();
        for (id, x) in [(1, 0.0), (2, 200.0)] {
            table.decks.push(TableDeck::from_definition(
                InstanceId(id),
                &Deck::new(format!("d{id}"), "Deck"),
                Point::new(x, 0.0),
                Size::new(100.0, 100.0),
                0,
            ));
        }
        let links = [
            SideDeckLink {
                source: InstanceId(1),
                side: InstanceId(2),
            },
            SideDeckLink {
                source: InstanceId(1),
                side: InstanceId(9),
            },
        ];

        let lines = connector_lines(&table, &links);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].from, Point::new(50.0, 50.0));
        assert_eq!(lines[0].to, Point::new(250.0, 50.0));

        table.decks[1].position = Point::new(200.0, 300.0);
        assert_eq!(connector_lines(&table, &links)[0].to, Point::new(250.0, 350.0));
    }
}
