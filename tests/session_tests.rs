//! Table session integration tests.
//!
//! These drive the session the way a UI would: place decks, draw, drag
//! cards around and reload, then check the table and the autosaved state.

mod common;

use common::{session, TestSession};
use rust_tabletop::cards::{DeckFormat, DeckSlot};
use rust_tabletop::core::{
    CardId, DeckId, InstanceId, SequenceShuffler, Severity, TableConfig, TableError,
};
use rust_tabletop::drag::DragEvent;
use rust_tabletop::spatial::{Point, Size};
use rust_tabletop::store::{EntityStore, KeyValueBackend, MemoryBackend, RecordStore, CARDS_KEY};
use rust_tabletop::table::{PawnShape, SideDeckLink, TableSession};

fn deck(id: &str) -> DeckId {
    DeckId::from(id)
}

fn card(id: &str) -> CardId {
    CardId::from(id)
}

fn reopen(session: &TestSession) -> TestSession {
    TableSession::with_rng(
        session.store().clone(),
        TableConfig::default(),
        SequenceShuffler::default(),
    )
    .unwrap()
}

// =============================================================================
// Drawing
// =============================================================================

#[test]
fn test_draw_places_card_next_to_deck() {
    let mut session = session();
    let heroes = session.add_deck(&deck("heroes"), Point::new(100.0, 50.0)).unwrap();

    let drawn = session.draw(heroes).unwrap();
    let instance = session.table().card(drawn).unwrap();

    assert_eq!(instance.card_id, card("hero"));
    assert_eq!(instance.position, Point::new(260.0, 50.0));
    assert_eq!(instance.source_name, "Heroes");
    assert!(instance.z > session.table().deck(heroes).unwrap().z);
    assert!(session.table().deck(heroes).unwrap().is_empty());

    // The stored definition is untouched.
    assert_eq!(session.decks().get(&deck("heroes")).unwrap().len(), 1);
}

#[test]
fn test_draw_from_empty_deck_notifies() {
    let mut session = session();
    let heroes = session.add_deck(&deck("heroes"), Point::default()).unwrap();
    session.draw(heroes).unwrap();

    let result = session.draw(heroes);
    assert!(matches!(result, Err(TableError::DeckEmpty)));

    let notices = session.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].severity, Severity::Notified);
    assert!(notices[0].message.contains("Heroes"));
    assert!(session.notices().is_empty());
}

#[test]
fn test_unknown_instances_are_errors() {
    let mut session = session();
    assert!(matches!(
        session.draw(InstanceId(42)),
        Err(TableError::UnknownInstance(InstanceId(42)))
    ));
    assert!(matches!(
        session.add_deck(&deck("nope"), Point::default()),
        Err(TableError::UnknownDeck(_))
    ));
    assert!(matches!(
        session.add_card(&card("nope"), Point::default()),
        Err(TableError::UnknownCard(_))
    ));
}

#[test]
fn test_shuffle_uses_injected_rng() {
    let mut session = session();
    let gear = session.add_deck(&deck("gear"), Point::default()).unwrap();

    // [sword, shield, potion] -> i=2,j=0 -> [potion, shield, sword]
    //                         -> i=1,j=0 -> [shield, potion, sword]
    session.shuffle(gear).unwrap();
    let slots: Vec<DeckSlot> = session.table().deck(gear).unwrap().slots.iter().cloned().collect();
    assert_eq!(
        slots,
        vec![
            DeckSlot::card("shield"),
            DeckSlot::card("potion"),
            DeckSlot::card("sword"),
        ]
    );
}

// =============================================================================
// Side decks
// =============================================================================

#[test]
fn test_finite_reference_spawns_side_deck() {
    let mut session = session();
    let loot = session.add_deck(&deck("loot"), Point::new(0.0, 0.0)).unwrap();

    let side = session.table().side_deck(&deck("gear")).unwrap();
    assert_eq!(side.side_deck_of, Some(loot));
    assert_eq!(side.position, Point::new(170.0, 0.0));
    assert_eq!(side.len(), 3);
    let side_id = side.id;

    assert_eq!(
        session.links(),
        &[SideDeckLink {
            source: loot,
            side: side_id
        }]
    );
    let lines = session.connector_lines();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].from, Point::new(75.0, 105.0));
    assert_eq!(lines[0].to, Point::new(245.0, 105.0));
}

#[test]
fn test_side_deck_is_shared_and_depletes() {
    let mut session = session();
    let first = session.add_deck(&deck("loot"), Point::new(0.0, 0.0)).unwrap();
    let second = session.add_deck(&deck("loot"), Point::new(0.0, 400.0)).unwrap();

    // One side deck, linked to both sources.
    let side_decks = session.table().decks.iter().filter(|d| d.is_side_deck()).count();
    assert_eq!(side_decks, 1);
    assert_eq!(session.links().len(), 2);

    let a = session.draw(first).unwrap();
    let b = session.draw(second).unwrap();
    assert_eq!(session.table().side_deck(&deck("gear")).unwrap().len(), 1);

    // Shuffled side deck is [shield, potion, sword].
    let drawn_a = session.table().card(a).unwrap();
    assert_eq!(drawn_a.card_id, card("shield"));
    assert_eq!(drawn_a.color, "#aa8800");
    assert_eq!(drawn_a.source_name, "Gear");
    assert_eq!(session.table().card(b).unwrap().card_id, card("potion"));
}

#[test]
fn test_missing_side_deck_notifies() {
    let mut session = session();
    let loot = session.add_deck(&deck("loot"), Point::default()).unwrap();
    let side = session.table().side_deck(&deck("gear")).unwrap().id;
    session.remove(side).unwrap();
    assert!(session.links().is_empty());

    let result = session.draw(loot);
    assert!(matches!(
        result,
        Err(TableError::Resolve(rust_tabletop::ResolveError::SideDeckMissing(_)))
    ));
    assert_eq!(session.notices()[0].severity, Severity::Notified);
    // The special slot was consumed.
    assert_eq!(session.table().deck(loot).unwrap().len(), 1);
}

#[test]
fn test_infinite_reference_leaves_source_intact() {
    let mut session = session();
    let monsters = session.add_deck(&deck("monsters"), Point::default()).unwrap();
    assert!(session.table().side_deck(&deck("gear")).is_none());

    let drawn = session.draw(monsters).unwrap();
    let instance = session.table().card(drawn).unwrap();
    assert_eq!(instance.card_id, card("sword"));
    assert_eq!(instance.source_name, "Gear");
    assert_eq!(session.decks().get(&deck("gear")).unwrap().len(), 3);
}

// =============================================================================
// Text variables
// =============================================================================

#[test]
fn test_placeholders_resolve_once_per_instance() {
    let mut session = session();
    let heroes = session.add_deck(&deck("heroes"), Point::default()).unwrap();
    let gear = session.add_deck(&deck("gear"), Point::new(0.0, 400.0)).unwrap();

    let hero = session.draw(heroes).unwrap();
    let rendered = session.render_card(hero).unwrap();

    assert_eq!(rendered.mechanical.plain(), "Wields Sword and Shield.");
    assert_eq!(rendered.flavor.plain(), "Never without Sword.");
    assert_eq!(session.table().deck(gear).unwrap().len(), 1);

    // Rendering again draws nothing new.
    let again = session.render_card(hero).unwrap();
    assert_eq!(again, rendered);
    assert_eq!(session.table().deck(gear).unwrap().len(), 1);
    assert_eq!(session.table().card(hero).unwrap().resolution.len(), 2);
}

#[test]
fn test_placeholder_without_deck_stays_literal() {
    let mut session = session();
    let heroes = session.add_deck(&deck("heroes"), Point::default()).unwrap();

    let hero = session.draw(heroes).unwrap();
    let rendered = session.render_card(hero).unwrap();
    assert_eq!(rendered.mechanical.plain(), "Wields {ITEM} and {ITEM:1}.");
    assert!(session.notices().is_empty());
}

#[test]
fn test_spawn_reference_copies_resolved_card() {
    let mut session = session();
    let heroes = session.add_deck(&deck("heroes"), Point::default()).unwrap();
    session.add_deck(&deck("gear"), Point::new(0.0, 400.0)).unwrap();

    let hero = session.draw(heroes).unwrap();
    let rendered = session.render_card(hero).unwrap();
    let sword = rendered.mechanical.references().next().unwrap().clone();

    let copy = session.spawn_reference(hero, &sword).unwrap();
    let instance = session.table().card(copy).unwrap();
    assert_eq!(instance.card_id, card("sword"));
    assert_eq!(instance.position, Point::new(320.0, 0.0));
}

// =============================================================================
// Gestures
// =============================================================================

#[test]
fn test_card_dropped_on_deck_returns_to_top() {
    let mut session = session();
    let heroes = session.add_deck(&deck("heroes"), Point::new(0.0, 0.0)).unwrap();
    let potion = session.add_card(&card("potion"), Point::new(500.0, 0.0)).unwrap();
    let sword = session.add_card(&card("sword"), Point::new(500.0, 10.0)).unwrap();
    session.toggle_starred(sword).unwrap();

    assert!(session.pointer_down(Point::new(500.0, 0.0), Some(potion)));
    assert!(session.pointer_move(Point::new(20.0, 0.0)));
    assert!(session.table().deck(heroes).unwrap().highlighted);

    let events = session.pointer_up().unwrap();
    assert!(matches!(
        events[..],
        [DragEvent::CardDroppedOnDeck { target, .. }] if target == heroes
    ));

    let live = session.table().deck(heroes).unwrap();
    assert!(!live.highlighted);
    let slots: Vec<DeckSlot> = live.slots.iter().cloned().collect();
    assert_eq!(
        slots,
        vec![
            DeckSlot::card("sword").starred(),
            DeckSlot::card("potion"),
            DeckSlot::card("hero"),
        ]
    );
    assert!(session.table().cards.is_empty());

    // Starred survives the trip back out.
    let drawn = session.draw(heroes).unwrap();
    assert!(session.table().card(drawn).unwrap().starred);
}

#[test]
fn test_drag_end_autosaves_positions() {
    let mut session = session();
    let pawn = session
        .add_pawn("red", PawnShape::Circle, Point::new(0.0, 0.0))
        .unwrap();

    session.pointer_down(Point::new(0.0, 0.0), Some(pawn));
    session.pointer_move(Point::new(100.0, 40.0));
    let events = session.pointer_up().unwrap();
    assert!(matches!(events[..], [DragEvent::DragEnded { .. }]));

    let saved = session.store().get_table_state().unwrap().unwrap();
    assert_eq!(saved.table_state.pawns[0].position, Point::new(100.0, 40.0));
}

#[test]
fn test_click_does_not_save_or_move() {
    let mut session = session();
    let potion = session.add_card(&card("potion"), Point::new(10.0, 10.0)).unwrap();

    session.pointer_down(Point::new(10.0, 10.0), Some(potion));
    assert!(!session.pointer_move(Point::new(12.0, 12.0)));
    assert!(session.pointer_up().unwrap().is_empty());
    assert_eq!(session.table().card(potion).unwrap().position, Point::new(10.0, 10.0));
}

#[test]
fn test_zoom_and_box_select() {
    let mut session = session();
    assert_eq!(session.zoom_by_wheel(100.0), 0.9);
    assert_eq!(session.zoom_by_wheel(-5000.0), 2.0);
    assert_eq!(session.zoom_by_wheel(5000.0), 0.5);

    let a = session.add_card(&card("potion"), Point::new(0.0, 0.0)).unwrap();
    let b = session.add_card(&card("sword"), Point::new(400.0, 0.0)).unwrap();
    let far = session.add_card(&card("shield"), Point::new(2000.0, 0.0)).unwrap();

    // At scale 0.5 the screen box (0,0)-(300,50) covers table x 0..600.
    let hits = session.box_select(Point::new(300.0, 50.0), Point::new(0.0, 0.0));
    assert_eq!(hits, vec![a, b]);
    assert!(session.selection().contains(a));
    assert!(!session.selection().contains(far));
}

#[test]
fn test_box_selection_drags_together() {
    let mut session = session();
    let a = session.add_card(&card("potion"), Point::new(0.0, 0.0)).unwrap();
    let b = session.add_card(&card("sword"), Point::new(400.0, 0.0)).unwrap();
    session.box_select(Point::new(0.0, 0.0), Point::new(600.0, 10.0));

    session.pointer_down(Point::new(0.0, 0.0), Some(a));
    session.pointer_move(Point::new(0.0, 300.0));
    session.pointer_up().unwrap();

    assert_eq!(session.table().card(a).unwrap().position, Point::new(0.0, 300.0));
    assert_eq!(session.table().card(b).unwrap().position, Point::new(400.0, 300.0));
}

#[test]
fn test_stacked_card_lifts_off_after_stack_drag() {
    let mut session = session();
    let bottom = session.add_card(&card("potion"), Point::new(0.0, 0.0)).unwrap();
    let top = session.add_card(&card("sword"), Point::new(10.0, 10.0)).unwrap();

    session.pointer_down(Point::new(0.0, 0.0), Some(bottom));
    session.pointer_move(Point::new(0.0, 300.0));
    session.pointer_up().unwrap();
    assert_eq!(session.table().card(top).unwrap().position, Point::new(10.0, 310.0));

    // Clicking empty table drops the selection.
    session.pointer_down(Point::new(2000.0, 2000.0), None);
    assert!(session.selection().is_empty());

    session.pointer_down(Point::new(10.0, 310.0), Some(top));
    session.pointer_move(Point::new(610.0, 310.0));
    session.pointer_up().unwrap();

    assert_eq!(session.table().card(bottom).unwrap().position, Point::new(0.0, 300.0));
    assert_eq!(session.table().card(top).unwrap().position, Point::new(610.0, 310.0));
}

// =============================================================================
// Card and token actions
// =============================================================================

#[test]
fn test_card_flags_and_format() {
    let mut session = session();
    let potion = session.add_card(&card("potion"), Point::default()).unwrap();

    assert!(session.toggle_face_down(potion).unwrap());
    assert!(!session.toggle_face_down(potion).unwrap());
    assert!(session.toggle_starred(potion).unwrap());

    session.set_card_format(potion, DeckFormat::Horizontal).unwrap();
    let instance = session.table().card(potion).unwrap();
    assert_eq!(instance.format, DeckFormat::Horizontal);
    assert_eq!(instance.size, Size::new(210.0, 150.0));
}

#[test]
fn test_resources() {
    let mut session = session();
    let life = session
        .add_resource("Life", 20, "green", Point::default())
        .unwrap();
    assert_eq!(session.adjust_resource(life, -3).unwrap(), 17);
    assert_eq!(session.adjust_resource(life, 5).unwrap(), 22);
    assert!(session.adjust_resource(InstanceId(99), 1).is_err());
}

#[test]
fn test_reset_clears_everything() {
    let mut session = session();
    session.add_deck(&deck("loot"), Point::default()).unwrap();
    session.add_pawn("blue", PawnShape::Square, Point::default()).unwrap();

    session.reset().unwrap();
    assert!(session.table().is_empty());
    assert!(session.links().is_empty());
    let saved = session.store().get_table_state().unwrap().unwrap();
    assert!(saved.table_state.is_empty());
}

// =============================================================================
// Persistence
// =============================================================================

#[test]
fn test_reopen_restores_autosave() {
    let mut session = session();
    let heroes = session.add_deck(&deck("heroes"), Point::default()).unwrap();
    session.add_deck(&deck("gear"), Point::new(0.0, 400.0)).unwrap();
    session.add_deck(&deck("loot"), Point::new(600.0, 0.0)).unwrap();
    let hero = session.draw(heroes).unwrap();
    let before = session.render_card(hero).unwrap();

    let mut reopened = reopen(&session);
    assert_eq!(reopened.table(), session.table());
    assert_eq!(reopened.links(), session.links());

    // Cached placeholders survive the reload without new draws.
    let after = reopened.render_card(hero).unwrap();
    assert_eq!(after, before);

    // New instances never collide with restored ones.
    let potion = reopened.add_card(&card("potion"), Point::default()).unwrap();
    assert_eq!(potion, InstanceId(session.table().max_instance_id() + 1));
}

#[test]
fn test_export_import_round_trip() {
    let mut session = session();
    let heroes = session.add_deck(&deck("heroes"), Point::default()).unwrap();
    session.add_deck(&deck("gear"), Point::new(0.0, 400.0)).unwrap();
    let hero = session.draw(heroes).unwrap();
    session.render_card(hero).unwrap();
    session.toggle_face_down(hero).unwrap();

    let json = session.export_json().unwrap();
    let before = session.table().clone();

    session.reset().unwrap();
    session.import_json(&json).unwrap();
    assert_eq!(*session.table(), before);

    // Into a session with an empty library: definitions come along.
    let mut fresh = TableSession::with_rng(
        RecordStore::in_memory(),
        TableConfig::default(),
        SequenceShuffler::default(),
    )
    .unwrap();
    fresh.import_json(&json).unwrap();
    assert_eq!(*fresh.table(), before);
    assert_eq!(fresh.cards().len(), 5);
    assert_eq!(fresh.decks().len(), 4);
}

#[test]
fn test_import_skips_orphaned_cards() {
    let mut session = session();
    session.add_card(&card("goblin"), Point::default()).unwrap();
    session.add_card(&card("potion"), Point::new(300.0, 0.0)).unwrap();

    let mut value: serde_json::Value = serde_json::from_str(&session.export_json().unwrap()).unwrap();
    value["definitions"]["cards"]
        .as_array_mut()
        .unwrap()
        .retain(|c| c["id"] != "goblin");

    let mut fresh = TableSession::with_rng(
        RecordStore::in_memory(),
        TableConfig::default(),
        SequenceShuffler::default(),
    )
    .unwrap();
    fresh.import_json(&value.to_string()).unwrap();

    assert_eq!(fresh.table().cards.len(), 1);
    assert_eq!(fresh.table().cards[0].card_id, card("potion"));
}

#[test]
fn test_import_rejects_garbage() {
    let mut session = session();
    assert!(matches!(
        session.import_json("{ not json"),
        Err(TableError::Store(_))
    ));
}

// =============================================================================
// Library
// =============================================================================

#[test]
fn test_library_editing() {
    let mut session = session();

    let added = session
        .bulk_import("Torch | Light 1 | Flickers | item, light\n\n | no name\nRope")
        .unwrap();
    assert_eq!(added, 2);
    let torch = session.search("torch", "").pop().unwrap().clone();
    assert_eq!(torch.display_id, Some(6));
    assert!(torch.has_tag("LIGHT"));

    assert_eq!(session.search("", "weapon").len(), 1);

    let count = session.add_cards_by_display(&deck("heroes"), "2-3, 99").unwrap();
    assert_eq!(count, 2);
    assert_eq!(session.decks().get(&deck("heroes")).unwrap().len(), 3);
    let stored = session.store().get_decks().unwrap();
    assert_eq!(stored.iter().find(|d| d.id == deck("heroes")).unwrap().len(), 3);

    assert_eq!(session.delete_cards_by_display("6-7").unwrap(), 2);
    assert_eq!(session.cards().len(), 5);
    assert_eq!(session.store().get_cards().unwrap().len(), 5);
}

#[test]
fn test_legacy_cards_get_numbers_on_open() {
    let mut backend = MemoryBackend::new();
    backend
        .set(
            CARDS_KEY,
            r#"[{"id":"old","name":"Old"},{"id":"new","name":"New","displayId":4}]"#.into(),
        )
        .unwrap();

    let session = TableSession::with_rng(
        RecordStore::new(backend),
        TableConfig::default(),
        SequenceShuffler::default(),
    )
    .unwrap();
    assert_eq!(session.cards().get(&card("old")).unwrap().display_id, Some(5));

    let stored = session.store().get_cards().unwrap();
    assert!(stored.iter().all(|c| c.display_id.is_some()));
}
