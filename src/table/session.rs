//! The table session: owns the library, the live table and the gesture
//! engine, and autosaves after every mutating action.

use tracing::{debug, info, warn};

use super::board::Table;
use super::instance::{PawnShape, TableCard, TableDeck, TablePawn, TableResource};
use super::links::{connector_lines, ConnectorLine, SideDeckLink};
use super::snapshot::{Definitions, TableSnapshot};
use crate::cards::{
    migrate_display_ids, parse_bulk_import, parse_display_ids, search, Card, CardRegistry, Deck,
    DeckFormat, DeckRegistry, DeckSlot, DEFAULT_DECK_COLOR,
};
use crate::core::{
    CardId, DeckId, InstanceId, ResolveError, Severity, Shuffler, StoreError, TableConfig,
    TableError, TableRng, ZOrderAllocator,
};
use crate::drag::{DragEngine, DragEvent, Selection};
use crate::resolve::{
    CardResolver, DrawContext, DrawSource, RenderedText, ResolutionContext, VariableEngine,
};
use crate::spatial::{Point, Rect, Size};
use crate::store::EntityStore;

/// A transient user-facing message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub severity: Severity,
}

/// A card instance with its text substituted, ready to display.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedCard {
    pub instance: InstanceId,
    pub card_id: CardId,
    pub display_id: Option<u32>,
    pub name: String,
    pub mechanical: RenderedText,
    pub flavor: RenderedText,
    pub tags: Vec<String>,
    pub color: String,
    pub face_down: bool,
    pub starred: bool,
    pub format: DeckFormat,
    pub source_name: String,
}

/// Definitions plus the live table, seen through split borrows.
struct SessionSource<'a> {
    cards: &'a CardRegistry,
    decks: &'a DeckRegistry,
    table: &'a mut Table,
}

impl DrawSource for SessionSource<'_> {
    fn card(&self, id: &CardId) -> Option<&Card> {
        self.cards.get(id)
    }

    fn stored_deck(&self, id: &DeckId) -> Option<&Deck> {
        self.decks.get(id)
    }

    fn side_deck_mut(&mut self, target: &DeckId) -> Option<&mut TableDeck> {
        self.table.side_deck_mut(target)
    }

    fn deck_by_handle_mut(&mut self, handle: &str) -> Option<&mut TableDeck> {
        self.table.deck_by_handle_mut(handle)
    }
}

/// One local table session.
pub struct TableSession<S: EntityStore, R: Shuffler = TableRng> {
    store: S,
    config: TableConfig,
    cards: CardRegistry,
    decks: DeckRegistry,
    table: Table,
    links: Vec<SideDeckLink>,
    drag: DragEngine,
    zorder: ZOrderAllocator,
    rng: R,
    resolver: CardResolver,
    text: VariableEngine,
    next_instance: u32,
    notices: Vec<Notice>,
}

impl<S: EntityStore> TableSession<S, TableRng> {
    /// Open a session with an entropy-seeded RNG.
    pub fn open(store: S, config: TableConfig) -> Result<Self, TableError> {
        Self::with_rng(store, config, TableRng::from_entropy())
    }
}

impl<S: EntityStore, R: Shuffler> TableSession<S, R> {
    /// Open a session, loading the library and the last autosaved table.
    pub fn with_rng(store: S, config: TableConfig, rng: R) -> Result<Self, TableError> {
        let resolver = CardResolver::new(config.max_special_depth);
        let mut session = Self {
            drag: DragEngine::new(&config),
            zorder: ZOrderAllocator::new(config.z_base),
            text: VariableEngine::new(resolver, config.max_text_depth),
            resolver,
            store,
            config,
            cards: CardRegistry::new(),
            decks: DeckRegistry::new(),
            table: Table::new(),
            links: Vec::new(),
            rng,
            next_instance: 0,
            notices: Vec::new(),
        };
        session.load_library()?;

        if let Some(snapshot) = session.store.get_table_state()? {
            session.restore(snapshot.table_state);
        }
        info!(
            cards = session.cards.len(),
            decks = session.decks.len(),
            instances = session.table.len(),
            "table session opened"
        );
        Ok(session)
    }

    // === Accessors ===

    #[must_use]
    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    #[must_use]
    pub fn table(&self) -> &Table {
        &self.table
    }

    #[must_use]
    pub fn cards(&self) -> &CardRegistry {
        &self.cards
    }

    #[must_use]
    pub fn decks(&self) -> &DeckRegistry {
        &self.decks
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub fn links(&self) -> &[SideDeckLink] {
        &self.links
    }

    #[must_use]
    pub fn selection(&self) -> &Selection {
        self.drag.selection()
    }

    #[must_use]
    pub fn scale(&self) -> f64 {
        self.drag.viewport().scale
    }

    #[must_use]
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    // === Library ===

    /// Save a card definition, assigning its display number if new.
    pub fn save_card(&mut self, card: Card) -> Result<Card, TableError> {
        let saved = self.store.save_card(card)?;
        self.cards.insert(saved.clone());
        Ok(saved)
    }

    pub fn delete_card(&mut self, id: &CardId) -> Result<bool, TableError> {
        self.cards.remove(id);
        Ok(self.store.delete_card(id)?)
    }

    /// Delete every card whose display number is listed, e.g. `"2, 5-7"`.
    pub fn delete_cards_by_display(&mut self, numbers: &str) -> Result<usize, TableError> {
        let ids: Vec<CardId> = parse_display_ids(numbers)
            .into_iter()
            .filter_map(|n| self.cards.get_by_display_id(n).map(|c| c.id.clone()))
            .collect();
        for id in &ids {
            self.delete_card(id)?;
        }
        Ok(ids.len())
    }

    /// Create one card per line of `Name | Mechanical | Flavor | tags` text.
    pub fn bulk_import(&mut self, text: &str) -> Result<usize, TableError> {
        let cards = parse_bulk_import(text);
        let count = cards.len();
        for card in cards {
            self.save_card(card)?;
        }
        info!(count, "bulk imported cards");
        Ok(count)
    }

    #[must_use]
    pub fn search(&self, name_query: &str, tag_query: &str) -> Vec<&Card> {
        search(self.cards.iter(), name_query, tag_query)
    }

    pub fn save_deck(&mut self, deck: Deck) -> Result<(), TableError> {
        self.store.save_deck(deck.clone())?;
        self.decks.insert(deck);
        Ok(())
    }

    pub fn delete_deck(&mut self, id: &DeckId) -> Result<bool, TableError> {
        self.decks.remove(id);
        Ok(self.store.delete_deck(id)?)
    }

    /// Append cards to a stored deck by display number, e.g. `"1, 3-5"`.
    ///
    /// Unknown numbers are skipped. Returns how many cards were added.
    pub fn add_cards_by_display(
        &mut self,
        deck: &DeckId,
        numbers: &str,
    ) -> Result<usize, TableError> {
        let mut stored = self
            .decks
            .get(deck)
            .cloned()
            .ok_or_else(|| TableError::UnknownDeck(deck.clone()))?;
        let mut added = 0;
        for number in parse_display_ids(numbers) {
            if let Some(card) = self.cards.get_by_display_id(number) {
                stored.add_card(card.id.clone());
                added += 1;
            }
        }
        self.save_deck(stored)?;
        Ok(added)
    }

    // === Placing elements ===

    /// Put a deep copy of a stored deck on the table.
    ///
    /// Every target of a finite random reference gets a side deck next to
    /// it, unless one is already on the table, in which case the existing
    /// side deck is linked instead.
    pub fn add_deck(&mut self, deck: &DeckId, position: Point) -> Result<InstanceId, TableError> {
        let stored = self
            .decks
            .get(deck)
            .cloned()
            .ok_or_else(|| TableError::UnknownDeck(deck.clone()))?;
        let id = self.allocate_id();
        let z = self.zorder.next_value();
        self.table.decks.push(TableDeck::from_definition(
            id,
            &stored,
            position,
            self.config.deck_size,
            z,
        ));
        debug!(instance = %id, deck = %stored.id, "deck placed");

        self.spawn_side_decks(id, &stored, position);
        self.autosave()?;
        Ok(id)
    }

    fn spawn_side_decks(&mut self, source: InstanceId, deck: &Deck, position: Point) {
        let step = self.config.deck_size.width + self.config.side_deck_gap;
        let mut pending = vec![(source, deck.finite_targets())];
        let mut spawned = 0.0;

        while let Some((source, targets)) = pending.pop() {
            for target in targets {
                if let Some(existing) = self.table.side_deck(&target) {
                    let side = existing.id;
                    self.link(source, side);
                    continue;
                }
                let Some(stored) = self.decks.get(&target).cloned() else {
                    self.report(&ResolveError::TargetDeckMissing(target));
                    continue;
                };

                spawned += 1.0;
                let id = self.allocate_id();
                let z = self.zorder.next_value();
                let mut side = TableDeck::from_definition(
                    id,
                    &stored,
                    Point::new(position.x + step * spawned, position.y),
                    self.config.deck_size,
                    z,
                );
                side.side_deck_of = Some(source);
                side.shuffle(&mut self.rng);
                self.table.decks.push(side);
                self.link(source, id);
                debug!(instance = %id, deck = %stored.id, source = %source, "side deck spawned");

                pending.push((id, stored.finite_targets()));
            }
        }
    }

    /// Put a copy of a stored card on the table, face up.
    pub fn add_card(&mut self, card: &CardId, position: Point) -> Result<InstanceId, TableError> {
        if !self.cards.contains(card) {
            return Err(TableError::UnknownCard(card.clone()));
        }
        let size = self.card_size(DeckFormat::Vertical);
        let id = self.place_card(TableCard {
            id: InstanceId(0),
            card_id: card.clone(),
            position,
            size,
            z: 0,
            color: DEFAULT_DECK_COLOR.to_string(),
            face_down: false,
            starred: false,
            format: DeckFormat::Vertical,
            source_name: String::new(),
            resolution: ResolutionContext::new(),
        });
        self.populate_text(id)?;
        self.autosave()?;
        Ok(id)
    }

    /// Spawn a fresh copy of a card referenced from the text of `from`.
    pub fn spawn_reference(
        &mut self,
        from: InstanceId,
        card: &CardId,
    ) -> Result<InstanceId, TableError> {
        let origin = self
            .table
            .card(from)
            .map(|c| c.position)
            .ok_or(TableError::UnknownInstance(from))?;
        self.add_card(card, origin.plus(self.config.draw_offset))
    }

    pub fn add_pawn(
        &mut self,
        color: impl Into<String>,
        shape: PawnShape,
        position: Point,
    ) -> Result<InstanceId, TableError> {
        let id = self.allocate_id();
        self.table.pawns.push(TablePawn {
            id,
            position,
            size: self.config.pawn_size,
            z: self.zorder.next_value(),
            color: color.into(),
            shape,
        });
        self.autosave()?;
        Ok(id)
    }

    pub fn add_resource(
        &mut self,
        label: impl Into<String>,
        value: i64,
        color: impl Into<String>,
        position: Point,
    ) -> Result<InstanceId, TableError> {
        let id = self.allocate_id();
        self.table.resources.push(TableResource {
            id,
            label: label.into(),
            value,
            position,
            size: self.config.resource_size,
            z: self.zorder.next_value(),
            color: color.into(),
        });
        self.autosave()?;
        Ok(id)
    }

    /// Add `delta` to a resource counter, returning the new value.
    pub fn adjust_resource(&mut self, id: InstanceId, delta: i64) -> Result<i64, TableError> {
        let resource = self
            .table
            .resource_mut(id)
            .ok_or(TableError::UnknownInstance(id))?;
        resource.value += delta;
        let value = resource.value;
        self.autosave()?;
        Ok(value)
    }

    // === Deck actions ===

    /// Draw the top slot of a table deck and place the resolved card next to it.
    pub fn draw(&mut self, deck: InstanceId) -> Result<InstanceId, TableError> {
        let live = self
            .table
            .deck_mut(deck)
            .ok_or(TableError::UnknownInstance(deck))?;
        let Some(slot) = live.draw() else {
            let message = format!("{} is empty", live.name);
            self.notify(message, Severity::Notified);
            return Err(TableError::DeckEmpty);
        };
        let ctx = DrawContext::from_table_deck(live);
        let position = live.position.plus(self.config.draw_offset);

        let mut source = SessionSource {
            cards: &self.cards,
            decks: &self.decks,
            table: &mut self.table,
        };
        let resolved = match self.resolver.resolve_draw(&slot, &ctx, &mut source, &mut self.rng) {
            Ok(resolved) => resolved,
            Err(err) => {
                self.report(&err);
                self.autosave()?;
                return Err(err.into());
            }
        };

        let size = self.card_size(resolved.format);
        let id = self.place_card(TableCard {
            id: InstanceId(0),
            card_id: resolved.card.id.clone(),
            position,
            size,
            z: 0,
            color: resolved.color,
            face_down: resolved.face_down,
            starred: resolved.starred,
            format: resolved.format,
            source_name: resolved.source_name,
            resolution: ResolutionContext::new(),
        });
        debug!(deck = %deck, instance = %id, card = %resolved.card.id, "card drawn");

        self.populate_text(id)?;
        self.autosave()?;
        Ok(id)
    }

    pub fn shuffle(&mut self, deck: InstanceId) -> Result<(), TableError> {
        let live = self
            .table
            .deck_mut(deck)
            .ok_or(TableError::UnknownInstance(deck))?;
        live.shuffle(&mut self.rng);
        debug!(deck = %deck, remaining = live.len(), "deck shuffled");
        self.autosave()
    }

    // === Card actions ===

    pub fn toggle_face_down(&mut self, id: InstanceId) -> Result<bool, TableError> {
        let card = self.table.card_mut(id).ok_or(TableError::UnknownInstance(id))?;
        card.face_down = !card.face_down;
        let face_down = card.face_down;
        self.autosave()?;
        Ok(face_down)
    }

    pub fn toggle_starred(&mut self, id: InstanceId) -> Result<bool, TableError> {
        let card = self.table.card_mut(id).ok_or(TableError::UnknownInstance(id))?;
        card.starred = !card.starred;
        let starred = card.starred;
        self.autosave()?;
        Ok(starred)
    }

    pub fn set_card_format(&mut self, id: InstanceId, format: DeckFormat) -> Result<(), TableError> {
        let size = self.card_size(format);
        let card = self.table.card_mut(id).ok_or(TableError::UnknownInstance(id))?;
        card.format = format;
        card.size = size;
        self.autosave()
    }

    /// Substitute the text of a card instance.
    ///
    /// Mechanical and flavor text share the instance's resolution context,
    /// so a placeholder resolves to the same card in both and across reloads.
    pub fn render_card(&mut self, id: InstanceId) -> Result<RenderedCard, TableError> {
        let (rendered, changed) = self.substitute_card(id)?;
        if changed {
            self.autosave()?;
        }
        Ok(rendered)
    }

    fn populate_text(&mut self, id: InstanceId) -> Result<(), TableError> {
        match self.substitute_card(id) {
            Ok(_) => Ok(()),
            // Orphaned instances render nothing.
            Err(TableError::UnknownCard(_)) => Ok(()),
            Err(err) => Err(err),
        }
    }

    fn substitute_card(&mut self, id: InstanceId) -> Result<(RenderedCard, bool), TableError> {
        let instance = self.table.card(id).ok_or(TableError::UnknownInstance(id))?.clone();
        let definition = self
            .cards
            .get(&instance.card_id)
            .cloned()
            .ok_or_else(|| TableError::UnknownCard(instance.card_id.clone()))?;

        let mut resolution = instance.resolution.clone();
        let mut source = SessionSource {
            cards: &self.cards,
            decks: &self.decks,
            table: &mut self.table,
        };
        let mechanical = self.text.substitute(
            &definition.mechanical_text,
            &mut resolution,
            &mut source,
            &mut self.rng,
        );
        let flavor = self.text.substitute(
            &definition.flavor_text,
            &mut resolution,
            &mut source,
            &mut self.rng,
        );

        for err in mechanical.failures.iter().chain(&flavor.failures) {
            self.report(err);
        }

        let changed = resolution != instance.resolution;
        if let Some(card) = self.table.card_mut(id) {
            card.resolution = resolution;
        }

        let rendered = RenderedCard {
            instance: id,
            card_id: definition.id,
            display_id: definition.display_id,
            name: definition.name,
            mechanical: mechanical.text,
            flavor: flavor.text,
            tags: definition.tags.into_iter().collect(),
            color: instance.color,
            face_down: instance.face_down,
            starred: instance.starred,
            format: instance.format,
            source_name: instance.source_name,
        };
        Ok((rendered, changed))
    }

    // === Table-wide actions ===

    /// Remove any element from the table.
    pub fn remove(&mut self, id: InstanceId) -> Result<(), TableError> {
        if !self.table.remove(id) {
            return Err(TableError::UnknownInstance(id));
        }
        self.links.retain(|l| l.source != id && l.side != id);
        self.drag.deselect(id);
        self.autosave()
    }

    /// Clear the table.
    pub fn reset(&mut self) -> Result<(), TableError> {
        self.clear_table();
        info!("table reset");
        self.autosave()
    }

    fn clear_table(&mut self) {
        self.table.clear();
        self.links.clear();
        self.drag.clear_selection();
        self.zorder = ZOrderAllocator::new(self.config.z_base);
        self.next_instance = 0;
    }

    /// Select every element intersecting the box spanned by two screen points.
    pub fn box_select(&mut self, corner_a: Point, corner_b: Point) -> Vec<InstanceId> {
        let viewport = self.drag.viewport();
        let area = Rect::from_corners(viewport.to_table(corner_a), viewport.to_table(corner_b));
        let mut hits = self.table.intersecting(&area);
        hits.sort();
        self.drag.set_selection(Selection::from_ids(hits.iter().copied()));
        hits
    }

    pub fn clear_selection(&mut self) {
        self.drag.clear_selection();
    }

    /// Zoom by a wheel delta, returning the new scale.
    pub fn zoom_by_wheel(&mut self, delta_y: f64) -> f64 {
        let current = self.drag.viewport().scale;
        let scale = self
            .config
            .clamp_scale(current - delta_y * self.config.wheel_sensitivity);
        self.drag.set_scale(scale);
        scale
    }

    /// Screen position of the table origin, after scrolling.
    pub fn set_viewport_origin(&mut self, origin: Point) {
        self.drag.set_origin(origin);
    }

    #[must_use]
    pub fn connector_lines(&self) -> Vec<ConnectorLine> {
        connector_lines(&self.table, &self.links)
    }

    // === Gestures ===

    pub fn pointer_down(&mut self, pointer: Point, hit: Option<InstanceId>) -> bool {
        self.drag.pointer_down(pointer, hit, &self.table)
    }

    pub fn pointer_move(&mut self, pointer: Point) -> bool {
        self.drag.pointer_move(pointer, &mut self.table, &mut self.zorder)
    }

    /// Finish a gesture and apply its outcome.
    pub fn pointer_up(&mut self) -> Result<Vec<DragEvent>, TableError> {
        let events = self.drag.pointer_up(&mut self.table);
        for event in &events {
            match event {
                DragEvent::CardDroppedOnDeck { target, stack, .. } => {
                    self.drop_on_deck(*target, stack);
                }
                DragEvent::DragEnded { .. } => {}
            }
        }
        if !events.is_empty() {
            self.autosave()?;
        }
        Ok(events)
    }

    fn drop_on_deck(&mut self, target: InstanceId, stack: &[(InstanceId, DeckSlot)]) {
        let Some(deck) = self.table.deck_mut(target) else {
            return;
        };
        // Lowest z first, so the visually topmost card ends up on top.
        for (_, slot) in stack {
            deck.push_top(slot.clone());
        }
        for (id, _) in stack {
            self.table.remove(*id);
            self.drag.deselect(*id);
        }
        debug!(deck = %target, cards = stack.len(), "cards returned to deck");
    }

    // === Persistence ===

    #[must_use]
    pub fn snapshot(&self) -> TableSnapshot {
        let mut cards: Vec<Card> = self.cards.iter().cloned().collect();
        cards.sort_by_key(|c| c.display_id.unwrap_or(u32::MAX));
        TableSnapshot::new(
            self.table.clone(),
            Definitions {
                cards,
                decks: self.decks.iter().cloned().collect(),
            },
        )
    }

    pub fn autosave(&mut self) -> Result<(), TableError> {
        let snapshot = self.snapshot();
        self.store.save_table_state(&snapshot)?;
        debug!(instances = self.table.len(), "table autosaved");
        Ok(())
    }

    pub fn export_json(&self) -> Result<String, TableError> {
        Ok(self.snapshot().to_json().map_err(StoreError::from)?)
    }

    /// Replace the table with an exported snapshot.
    ///
    /// Definitions missing from the library are added first; card
    /// instances whose definition is still unknown are dropped.
    pub fn import_json(&mut self, json: &str) -> Result<(), TableError> {
        let snapshot = TableSnapshot::from_json(json).map_err(StoreError::from)?;
        self.clear_table();

        for card in snapshot.definitions.cards {
            if !self.cards.contains(&card.id) {
                self.save_card(card)?;
            }
        }
        for deck in snapshot.definitions.decks {
            if self.decks.get(&deck.id).is_none() {
                self.save_deck(deck)?;
            }
        }

        self.restore(snapshot.table_state);
        info!(instances = self.table.len(), "table imported");
        self.autosave()
    }

    fn load_library(&mut self) -> Result<(), TableError> {
        let mut cards = self.store.get_cards()?;
        let migrated = migrate_display_ids(&mut cards);
        if migrated > 0 {
            info!(migrated, "assigned display numbers to legacy cards");
            for card in &cards {
                self.store.save_card(card.clone())?;
            }
        }
        self.cards = CardRegistry::from_cards(cards);
        self.decks = DeckRegistry::from_decks(self.store.get_decks()?);
        Ok(())
    }

    fn restore(&mut self, mut table: Table) {
        let before = table.cards.len();
        table.cards.retain(|c| self.cards.contains(&c.card_id));
        let orphaned = before - table.cards.len();
        if orphaned > 0 {
            debug!(orphaned, "skipped orphaned card instances");
        }
        for card in &mut table.cards {
            card.resolution.retain_cards(|id| self.cards.contains(id));
        }

        self.next_instance = self.next_instance.max(table.max_instance_id());
        self.zorder.observe(table.max_z());
        self.table = table;

        let mut links = Vec::new();
        for deck in &self.table.decks {
            if let Some(source) = deck.side_deck_of {
                links.push(SideDeckLink {
                    source,
                    side: deck.id,
                });
            }
        }
        for deck in &self.table.decks {
            for target in deck.finite_targets() {
                if let Some(side) = self.table.side_deck(&target) {
                    links.push(SideDeckLink {
                        source: deck.id,
                        side: side.id,
                    });
                }
            }
        }
        self.links.clear();
        for link in links {
            self.link(link.source, link.side);
        }
    }

    // === Helpers ===

    fn allocate_id(&mut self) -> InstanceId {
        self.next_instance += 1;
        InstanceId(self.next_instance)
    }

    fn place_card(&mut self, mut card: TableCard) -> InstanceId {
        card.id = self.allocate_id();
        card.z = self.zorder.next_value();
        let id = card.id;
        self.table.cards.push(card);
        id
    }

    fn card_size(&self, format: DeckFormat) -> Size {
        let base = self.config.card_size;
        match format {
            DeckFormat::Vertical => base,
            DeckFormat::Horizontal => Size::new(base.height, base.width),
            DeckFormat::Square => Size::new(base.width, base.width),
        }
    }

    fn link(&mut self, source: InstanceId, side: InstanceId) {
        let link = SideDeckLink { source, side };
        if source != side && !self.links.contains(&link) {
            self.links.push(link);
        }
    }

    fn notify(&mut self, message: String, severity: Severity) {
        warn!(%message, "table notice");
        self.notices.push(Notice { message, severity });
    }

    fn report(&mut self, err: &ResolveError) {
        match err.severity() {
            Severity::Silent | Severity::Orphaned => {
                debug!(error = %err, "ignored resolution failure");
            }
            severity @ (Severity::Notified | Severity::Guarded) => {
                self.notify(err.to_string(), severity);
            }
        }
    }
}
