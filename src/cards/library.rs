//! Library editing helpers: number ranges, bulk text import, search and
//! display-number migration.

use rustc_hash::FxHashSet;

use super::definition::{Card, Tags};

/// Parse a display-number list such as `"1, 3-5, 8"`.
///
/// Ranges are inclusive. Malformed parts are ignored, duplicates are
/// dropped, and first-seen order is kept.
///
/// ```
/// use rust_tabletop::cards::parse_display_ids;
///
/// assert_eq!(parse_display_ids("1, 3-5, 8"), vec![1, 3, 4, 5, 8]);
/// assert_eq!(parse_display_ids("x, 2, 2"), vec![2]);
/// ```
#[must_use]
pub fn parse_display_ids(input: &str) -> Vec<u32> {
    let mut ids = Vec::new();
    let mut seen = FxHashSet::default();
    let mut push = |id: u32| {
        if seen.insert(id) {
            ids.push(id);
        }
    };

    for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if let Some((start, end)) = part.split_once('-') {
            let (Ok(start), Ok(end)) = (start.trim().parse::<u32>(), end.trim().parse::<u32>())
            else {
                continue;
            };
            for id in start..=end {
                push(id);
            }
        } else if let Ok(id) = part.parse::<u32>() {
            push(id);
        }
    }
    ids
}

/// Parse bulk-import text, one card per line: `Name | Mechanical | Flavor | tag1, tag2`.
///
/// Missing trailing fields are empty; lines without a name are skipped.
/// Returned cards have fresh ids and no display number yet.
#[must_use]
pub fn parse_bulk_import(text: &str) -> Vec<Card> {
    text.lines()
        .filter_map(|line| {
            let mut parts = line.split('|').map(str::trim);
            let name = parts.next().unwrap_or_default();
            if name.is_empty() {
                return None;
            }
            let mechanical = parts.next().unwrap_or_default();
            let flavor = parts.next().unwrap_or_default();
            let tags: Tags = parts
                .next()
                .map(|t| {
                    t.split(',')
                        .map(str::trim)
                        .filter(|t| !t.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default();

            let mut card = Card::with_generated_id(name)
                .with_mechanical_text(mechanical)
                .with_flavor_text(flavor);
            card.tags = tags;
            Some(card)
        })
        .collect()
}

/// Filter cards by case-insensitive name substring and tag substring.
///
/// An empty query matches everything. Results are sorted by display
/// number, unnumbered cards last.
#[must_use]
pub fn search<'a>(
    cards: impl IntoIterator<Item = &'a Card>,
    name_query: &str,
    tag_query: &str,
) -> Vec<&'a Card> {
    let name_query = name_query.to_lowercase();
    let tag_query = tag_query.to_lowercase();

    let mut found: Vec<&Card> = cards
        .into_iter()
        .filter(|card| card.name.to_lowercase().contains(&name_query))
        .filter(|card| {
            tag_query.is_empty()
                || card.tags.iter().any(|t| t.to_lowercase().contains(&tag_query))
        })
        .collect();
    found.sort_by_key(|c| c.display_id.unwrap_or(u32::MAX));
    found
}

/// Give every card without a display number the next free one.
///
/// Returns how many cards were numbered.
pub fn migrate_display_ids(cards: &mut [Card]) -> usize {
    let mut next = cards.iter().filter_map(|c| c.display_id).max().unwrap_or(0);
    let mut migrated = 0;
    for card in cards.iter_mut().filter(|c| c.display_id.is_none()) {
        next += 1;
        card.display_id = Some(next);
        migrated += 1;
    }
    migrated
}
