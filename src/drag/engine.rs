//! The drag gesture state machine.
//!
//! `Idle -> Armed -> Dragging -> Idle`. A press arms a candidate; moving the
//! pointer past the threshold starts the drag, lifts the drag group to the
//! top of the z-order and from then on moves every member in lockstep.
//! Releasing either drops cards onto a deck or snaps the group onto the
//! element it mostly covers.

use rustc_hash::FxHashMap;
use tracing::debug;

use super::stack::{compute_drag_group, compute_selection, DragGroup};
use super::surface::{DragSurface, ElementKind, ElementView, Selection};
use crate::cards::DeckSlot;
use crate::core::{InstanceId, TableConfig, ZOrderAllocator};
use crate::spatial::{overlap_ratio, overlaps, Point, Viewport};

/// Where a gesture currently is.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum DragPhase {
    #[default]
    Idle,
    /// Pointer is down on `candidate` but has not moved far enough yet.
    Armed { candidate: InstanceId, start: Point },
    Dragging,
}

/// Notifications produced when a gesture finishes.
#[derive(Clone, Debug, PartialEq)]
pub enum DragEvent {
    /// Cards were released over a deck. The session pushes them into the
    /// deck and removes them from the table; no snapping happens.
    CardDroppedOnDeck {
        /// Slot of the directly dragged card.
        card: DeckSlot,
        /// Deck instance the cards were dropped on.
        target: InstanceId,
        /// Every dropped card with its slot, lowest z first.
        stack: Vec<(InstanceId, DeckSlot)>,
    },
    /// A drag finished anywhere else.
    DragEnded { moved: Vec<InstanceId> },
}

#[derive(Clone, Debug)]
struct ActiveDrag {
    primary: InstanceId,
    primary_kind: ElementKind,
    members: DragGroup,
    /// Pointer-to-corner offsets in screen px, captured at drag start.
    offsets: FxHashMap<InstanceId, Point>,
    hovered_deck: Option<InstanceId>,
}

/// Headless drag engine.
///
/// The engine owns the selection and the viewport. Geometry is read from
/// the [`DragSurface`] on every call, never cached between ticks.
#[derive(Clone, Debug)]
pub struct DragEngine {
    threshold: f64,
    grid_size: f64,
    snap_offset: Point,
    significant_overlap: f64,
    viewport: Viewport,
    selection: Selection,
    /// The selection was set by a drag gathering its stack, not by the user.
    stack_selected: bool,
    phase: DragPhase,
    active: Option<ActiveDrag>,
}

impl DragEngine {
    #[must_use]
    pub fn new(config: &TableConfig) -> Self {
        Self {
            threshold: config.drag_threshold,
            grid_size: config.grid_size,
            snap_offset: config.snap_offset,
            significant_overlap: config.significant_overlap,
            viewport: Viewport::default(),
            selection: Selection::new(),
            stack_selected: false,
            phase: DragPhase::Idle,
            active: None,
        }
    }

    #[must_use]
    pub fn phase(&self) -> &DragPhase {
        &self.phase
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.phase == DragPhase::Dragging
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn set_scale(&mut self, scale: f64) {
        self.viewport.scale = scale;
    }

    /// Screen position of the canvas origin (after scrolling).
    pub fn set_origin(&mut self, origin: Point) {
        self.viewport.origin = origin;
    }

    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection;
        self.stack_selected = false;
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.stack_selected = false;
    }

    /// Drop one element from the selection, e.g. after it left the table.
    pub fn deselect(&mut self, id: InstanceId) {
        self.selection.remove(id);
    }

    /// Members of the drag in progress, lowest z first.
    #[must_use]
    pub fn drag_group(&self) -> &[InstanceId] {
        self.active.as_ref().map_or(&[], |a| a.members.as_slice())
    }

    /// Pointer pressed at `pointer` (screen px) over `hit`, if anything.
    ///
    /// Returns whether a gesture was armed. Nothing moves yet. A press on
    /// empty table clears the selection.
    pub fn pointer_down(
        &mut self,
        pointer: Point,
        hit: Option<InstanceId>,
        surface: &impl DragSurface,
    ) -> bool {
        self.active = None;
        self.phase = match hit.filter(|id| surface.element(*id).is_some()) {
            Some(candidate) => DragPhase::Armed {
                candidate,
                start: pointer,
            },
            None => {
                self.clear_selection();
                DragPhase::Idle
            }
        };
        matches!(self.phase, DragPhase::Armed { .. })
    }

    /// Pointer moved to `pointer` (screen px).
    ///
    /// Returns whether a drag is in progress after the move.
    pub fn pointer_move(
        &mut self,
        pointer: Point,
        surface: &mut impl DragSurface,
        zorder: &mut ZOrderAllocator,
    ) -> bool {
        match self.phase.clone() {
            DragPhase::Idle => false,
            DragPhase::Armed { candidate, start } => {
                if pointer.distance(start) <= self.threshold {
                    return false;
                }
                if !self.begin(candidate, start, surface, zorder) {
                    self.phase = DragPhase::Idle;
                    return false;
                }
                self.phase = DragPhase::Dragging;
                self.follow(pointer, surface);
                true
            }
            DragPhase::Dragging => {
                self.follow(pointer, surface);
                true
            }
        }
    }

    /// Pointer released. A gesture that never crossed the threshold is a
    /// click and produces no events.
    pub fn pointer_up(&mut self, surface: &mut impl DragSurface) -> Vec<DragEvent> {
        let phase = std::mem::take(&mut self.phase);
        let Some(active) = self.active.take() else {
            return Vec::new();
        };
        if phase != DragPhase::Dragging {
            return Vec::new();
        }

        if let Some(deck) = active.hovered_deck {
            surface.set_drop_highlight(deck, false);
        }

        let elements = surface.elements();
        let views: FxHashMap<InstanceId, &ElementView> =
            elements.iter().map(|e| (e.id, e)).collect();

        if active.primary_kind == ElementKind::Card {
            if let Some(target) = deck_under(&active.members, &elements) {
                let stack: Vec<(InstanceId, DeckSlot)> = active
                    .members
                    .iter()
                    .filter(|id| views.get(*id).is_some_and(|v| v.kind == ElementKind::Card))
                    .filter_map(|id| surface.drop_payload(*id).map(|slot| (*id, slot)))
                    .collect();
                if let Some(card) = surface.drop_payload(active.primary) {
                    debug!(deck = %target, cards = stack.len(), "cards dropped on deck");
                    return vec![DragEvent::CardDroppedOnDeck {
                        card,
                        target,
                        stack,
                    }];
                }
            }
        }

        if !active.primary_kind.is_no_stack() {
            if let Some(primary) = views.get(&active.primary) {
                self.snap(&active.members, primary, &elements, surface);
            }
        }

        debug!(primary = %active.primary, members = active.members.len(), "drag ended");
        vec![DragEvent::DragEnded {
            moved: active.members.to_vec(),
        }]
    }

    /// Gather the group and capture offsets relative to the press point.
    fn begin(
        &mut self,
        candidate: InstanceId,
        pressed: Point,
        surface: &mut impl DragSurface,
        zorder: &mut ZOrderAllocator,
    ) -> bool {
        let elements = surface.elements();
        let Some(view) = elements.iter().find(|e| e.id == candidate) else {
            return false;
        };

        // A stack gathered by an earlier drag is not a user multi-selection.
        let current = if self.stack_selected {
            Selection::new()
        } else {
            self.selection.clone()
        };
        let selection = compute_selection(candidate, &current);
        let members = compute_drag_group(view, &selection, &elements, self.significant_overlap);
        self.stack_selected = !selection.is_multi();
        self.selection = Selection::from_ids(members.iter().copied());

        let mut offsets = FxHashMap::default();
        for id in &members {
            if let Some(member) = elements.iter().find(|e| e.id == *id) {
                let corner = self.viewport.to_screen(&member.rect).origin();
                offsets.insert(*id, pressed.minus(corner));
            }
            // Members are sorted by z, so fresh values keep their order.
            surface.set_z(*id, zorder.next_value());
        }

        debug!(primary = %candidate, members = members.len(), "drag started");
        self.active = Some(ActiveDrag {
            primary: candidate,
            primary_kind: view.kind,
            members,
            offsets,
            hovered_deck: None,
        });
        true
    }

    fn follow(&mut self, pointer: Point, surface: &mut impl DragSurface) {
        let Some(active) = self.active.as_mut() else {
            return;
        };

        for id in &active.members {
            let Some(offset) = active.offsets.get(id) else {
                continue;
            };
            let screen = pointer.minus(self.viewport.origin).minus(*offset);
            let position = Point::new(
                screen.x / self.viewport.scale,
                screen.y / self.viewport.scale,
            );
            surface.move_to(*id, snap_to_grid(position, self.grid_size));
        }

        if active.primary_kind != ElementKind::Card {
            return;
        }
        let elements = surface.elements();
        let hovered = deck_under(&active.members, &elements);
        if hovered != active.hovered_deck {
            if let Some(old) = active.hovered_deck {
                surface.set_drop_highlight(old, false);
            }
            if let Some(new) = hovered {
                surface.set_drop_highlight(new, true);
            }
            active.hovered_deck = hovered;
        }
    }

    fn snap(
        &self,
        members: &[InstanceId],
        primary: &ElementView,
        elements: &[ElementView],
        surface: &mut impl DragSurface,
    ) {
        let target = elements
            .iter()
            .filter(|e| !members.contains(&e.id))
            .map(|e| (e, overlap_ratio(&e.rect, &primary.rect)))
            .filter(|(_, ratio)| *ratio > self.significant_overlap)
            .max_by(|a, b| a.1.total_cmp(&b.1));

        let Some((target, _)) = target else {
            return;
        };

        let delta = target
            .rect
            .origin()
            .plus(self.snap_offset)
            .minus(primary.rect.origin());
        for id in members {
            if let Some(member) = elements.iter().find(|e| e.id == *id) {
                surface.move_to(*id, member.rect.origin().plus(delta));
            }
        }
        debug!(target = %target.id, "snapped drag group");
    }
}

/// The topmost drop-target deck overlapped by the bottom member of the group.
fn deck_under(members: &[InstanceId], elements: &[ElementView]) -> Option<InstanceId> {
    let bottom = members.first()?;
    let bottom = elements.iter().find(|e| e.id == *bottom)?;
    elements
        .iter()
        .filter(|e| e.drop_target && !members.contains(&e.id))
        .filter(|e| overlaps(&bottom.rect, &e.rect))
        .max_by_key(|e| e.z)
        .map(|e| e.id)
}

fn snap_to_grid(position: Point, grid: f64) -> Point {
    if grid <= 1.0 {
        return position;
    }
    Point::new(
        (position.x / grid).round() * grid,
        (position.y / grid).round() * grid,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::Rect;

    #[derive(Default)]
    struct Board {
        elements: Vec<ElementView>,
        highlighted: Vec<InstanceId>,
    }

    impl Board {
        fn with(mut self, id: u32, kind: ElementKind, x: f64, y: f64, z: u64) -> Self {
            self.elements.push(ElementView {
                id: InstanceId(id),
                kind,
                rect: Rect::new(x, y, 100.0, 100.0),
                z,
                drop_target: kind == ElementKind::Deck,
            });
            self
        }

        fn get(&self, id: u32) -> &ElementView {
            self.elements.iter().find(|e| e.id == InstanceId(id)).unwrap()
        }
    }

    impl DragSurface for Board {
        fn elements(&self) -> Vec<ElementView> {
            self.elements.clone()
        }

        fn move_to(&mut self, id: InstanceId, position: Point) {
            if let Some(e) = self.elements.iter_mut().find(|e| e.id == id) {
                e.rect.x = position.x;
                e.rect.y = position.y;
            }
        }

        fn set_z(&mut self, id: InstanceId, z: u64) {
            if let Some(e) = self.elements.iter_mut().find(|e| e.id == id) {
                e.z = z;
            }
        }

        fn set_drop_highlight(&mut self, id: InstanceId, highlighted: bool) {
            self.highlighted.retain(|h| *h != id);
            if highlighted {
                self.highlighted.push(id);
            }
        }

        fn drop_payload(&self, id: InstanceId) -> Option<DeckSlot> {
            Some(DeckSlot::card(format!("card-{}", id.0)))
        }
    }

    fn engine() -> DragEngine {
        DragEngine::new(&TableConfig::default())
    }

    #[test]
    fn test_click_is_not_a_drag() {
        let mut board = Board::default().with(1, ElementKind::Card, 0.0, 0.0, 1);
        let mut engine = engine();
        let mut z = ZOrderAllocator::new(1000);

        assert!(engine.pointer_down(Point::new(10.0, 10.0), Some(InstanceId(1)), &board));
        assert!(!engine.pointer_move(Point::new(13.0, 13.0), &mut board, &mut z));
        assert!(engine.pointer_up(&mut board).is_empty());

        assert_eq!(board.get(1).rect.origin(), Point::new(0.0, 0.0));
        assert_eq!(board.get(1).z, 1);
        assert_eq!(*engine.phase(), DragPhase::Idle);
    }

    #[test]
    fn test_press_on_nothing_does_not_arm() {
        let board = Board::default();
        let mut engine = engine();
        assert!(!engine.pointer_down(Point::default(), None, &board));
        assert!(!engine.pointer_down(Point::default(), Some(InstanceId(4)), &board));
    }

    #[test]
    fn test_drag_moves_with_pointer() {
        let mut board = Board::default().with(1, ElementKind::Card, 0.0, 0.0, 1);
        let mut engine = engine();
        let mut z = ZOrderAllocator::new(1000);

        engine.pointer_down(Point::new(10.0, 10.0), Some(InstanceId(1)), &board);
        assert!(engine.pointer_move(Point::new(60.0, 30.0), &mut board, &mut z));
        assert_eq!(board.get(1).rect.origin(), Point::new(50.0, 20.0));
        assert_eq!(board.get(1).z, 1001);

        let events = engine.pointer_up(&mut board);
        assert_eq!(
            events,
            vec![DragEvent::DragEnded {
                moved: vec![InstanceId(1)]
            }]
        );
    }

    #[test]
    fn test_zoom_compensation() {
        let mut board = Board::default().with(1, ElementKind::Card, 10.0, 10.0, 1);
        let mut engine = engine();
        engine.set_viewport(Viewport::new(Point::new(100.0, 100.0), 2.0));
        let mut z = ZOrderAllocator::new(1000);

        // Element corner is at screen (120, 120).
        engine.pointer_down(Point::new(130.0, 130.0), Some(InstanceId(1)), &board);
        engine.pointer_move(Point::new(170.0, 130.0), &mut board, &mut z);

        // 40 screen px at scale 2 is 20 table px.
        assert_eq!(board.get(1).rect.origin(), Point::new(30.0, 10.0));
    }

    #[test]
    fn test_grid_rounding() {
        let mut board = Board::default().with(1, ElementKind::Pawn, 0.0, 0.0, 1);
        let mut engine = DragEngine::new(&TableConfig::default().with_grid_size(20.0));
        let mut z = ZOrderAllocator::new(0);

        engine.pointer_down(Point::new(0.0, 0.0), Some(InstanceId(1)), &board);
        engine.pointer_move(Point::new(27.0, 9.0), &mut board, &mut z);
        assert_eq!(board.get(1).rect.origin(), Point::new(20.0, 0.0));

        engine.pointer_move(Point::new(31.0, 11.0), &mut board, &mut z);
        assert_eq!(board.get(1).rect.origin(), Point::new(40.0, 20.0));
    }

    #[test]
    fn test_snap_onto_covered_card() {
        let mut board = Board::default()
            .with(1, ElementKind::Card, 0.0, 0.0, 1)
            .with(2, ElementKind::Card, 500.0, 0.0, 2);
        let mut engine = engine();
        let mut z = ZOrderAllocator::new(1000);

        engine.pointer_down(Point::new(0.0, 0.0), Some(InstanceId(2)), &board);
        engine.pointer_move(Point::new(-480.0, 10.0), &mut board, &mut z);
        assert_eq!(board.get(2).rect.origin(), Point::new(20.0, 10.0));

        engine.pointer_up(&mut board);
        assert_eq!(board.get(2).rect.origin(), Point::new(12.0, 24.0));
    }

    #[test]
    fn test_pawn_never_snaps() {
        let mut board = Board::default()
            .with(1, ElementKind::Card, 0.0, 0.0, 1)
            .with(2, ElementKind::Pawn, 500.0, 0.0, 2);
        let mut engine = engine();
        let mut z = ZOrderAllocator::new(1000);

        engine.pointer_down(Point::new(0.0, 0.0), Some(InstanceId(2)), &board);
        engine.pointer_move(Point::new(-490.0, 0.0), &mut board, &mut z);
        engine.pointer_up(&mut board);
        assert_eq!(board.get(2).rect.origin(), Point::new(10.0, 0.0));
    }

    #[test]
    fn test_drop_on_deck_highlights_then_emits() {
        let mut board = Board::default()
            .with(1, ElementKind::Deck, 0.0, 0.0, 1)
            .with(2, ElementKind::Card, 300.0, 0.0, 2)
            .with(3, ElementKind::Card, 300.0, 10.0, 3);
        let mut engine = engine();
        let mut z = ZOrderAllocator::new(1000);

        engine.pointer_down(Point::new(300.0, 0.0), Some(InstanceId(2)), &board);
        engine.pointer_move(Point::new(50.0, 0.0), &mut board, &mut z);
        assert_eq!(board.highlighted, vec![InstanceId(1)]);

        let events = engine.pointer_up(&mut board);
        assert!(board.highlighted.is_empty());
        assert_eq!(
            events,
            vec![DragEvent::CardDroppedOnDeck {
                card: DeckSlot::card("card-2"),
                target: InstanceId(1),
                stack: vec![
                    (InstanceId(2), DeckSlot::card("card-2")),
                    (InstanceId(3), DeckSlot::card("card-3")),
                ],
            }]
        );
    }

    #[test]
    fn test_dragged_deck_is_not_dropped() {
        let mut board = Board::default()
            .with(1, ElementKind::Deck, 0.0, 0.0, 1)
            .with(2, ElementKind::Deck, 300.0, 0.0, 2);
        let mut engine = engine();
        let mut z = ZOrderAllocator::new(1000);

        engine.pointer_down(Point::new(300.0, 0.0), Some(InstanceId(2)), &board);
        engine.pointer_move(Point::new(10.0, 0.0), &mut board, &mut z);
        assert!(board.highlighted.is_empty());

        let events = engine.pointer_up(&mut board);
        assert!(matches!(events[..], [DragEvent::DragEnded { .. }]));
        // Snapped onto the other deck instead.
        assert_eq!(board.get(2).rect.origin(), Point::new(12.0, 24.0));
    }

    #[test]
    fn test_selection_follows_drag_group() {
        let mut board = Board::default()
            .with(1, ElementKind::Card, 0.0, 0.0, 1)
            .with(2, ElementKind::Card, 10.0, 10.0, 2);
        let mut engine = engine();
        let mut z = ZOrderAllocator::new(1000);

        engine.pointer_down(Point::new(0.0, 0.0), Some(InstanceId(1)), &board);
        engine.pointer_move(Point::new(0.0, 100.0), &mut board, &mut z);
        assert_eq!(engine.drag_group(), &[InstanceId(1), InstanceId(2)]);
        assert!(engine.selection().contains(InstanceId(2)));
        assert_eq!(board.get(1).z, 1001);
        assert_eq!(board.get(2).z, 1002);
    }

    #[test]
    fn test_offset_taken_from_press_point() {
        let mut board = Board::default().with(1, ElementKind::Card, 0.0, 0.0, 1);
        let mut engine = engine();
        let mut z = ZOrderAllocator::new(1000);

        engine.pointer_down(Point::new(0.0, 0.0), Some(InstanceId(1)), &board);
        assert!(engine.pointer_move(Point::new(0.0, 300.0), &mut board, &mut z));
        assert_eq!(board.get(1).rect.origin(), Point::new(0.0, 300.0));

        engine.pointer_move(Point::new(40.0, 320.0), &mut board, &mut z);
        assert_eq!(board.get(1).rect.origin(), Point::new(40.0, 320.0));
    }

    #[test]
    fn test_top_card_lifts_off_after_stack_drag() {
        let mut board = Board::default()
            .with(1, ElementKind::Card, 0.0, 0.0, 1)
            .with(2, ElementKind::Card, 10.0, 10.0, 2);
        let mut engine = engine();
        let mut z = ZOrderAllocator::new(1000);

        engine.pointer_down(Point::new(0.0, 0.0), Some(InstanceId(1)), &board);
        engine.pointer_move(Point::new(0.0, 300.0), &mut board, &mut z);
        engine.pointer_up(&mut board);
        assert_eq!(board.get(2).rect.origin(), Point::new(10.0, 310.0));

        // Straight away, without clicking elsewhere first.
        engine.pointer_down(Point::new(10.0, 310.0), Some(InstanceId(2)), &board);
        engine.pointer_move(Point::new(510.0, 310.0), &mut board, &mut z);
        engine.pointer_up(&mut board);

        assert_eq!(board.get(1).rect.origin(), Point::new(0.0, 300.0));
        assert_eq!(board.get(2).rect.origin(), Point::new(510.0, 310.0));
        assert_eq!(engine.selection(), &Selection::single(InstanceId(2)));
    }

    #[test]
    fn test_press_on_empty_table_clears_selection() {
        let mut board = Board::default()
            .with(1, ElementKind::Card, 0.0, 0.0, 1)
            .with(2, ElementKind::Card, 900.0, 0.0, 2);
        let mut engine = engine();
        let mut z = ZOrderAllocator::new(1000);
        engine.set_selection(Selection::from_ids([InstanceId(1), InstanceId(2)]));

        assert!(!engine.pointer_down(Point::new(500.0, 500.0), None, &board));
        assert!(engine.selection().is_empty());

        engine.pointer_down(Point::new(0.0, 0.0), Some(InstanceId(1)), &board);
        engine.pointer_move(Point::new(0.0, 200.0), &mut board, &mut z);
        engine.pointer_up(&mut board);
        assert_eq!(board.get(2).rect.origin(), Point::new(900.0, 0.0));
    }

    #[test]
    fn test_user_multi_selection_survives_drag() {
        let mut board = Board::default()
            .with(1, ElementKind::Card, 0.0, 0.0, 1)
            .with(2, ElementKind::Card, 900.0, 0.0, 2);
        let mut engine = engine();
        let mut z = ZOrderAllocator::new(1000);
        engine.set_selection(Selection::from_ids([InstanceId(1), InstanceId(2)]));

        for step in 1..=2 {
            let y = 200.0 * f64::from(step);
            engine.pointer_down(Point::new(0.0, y - 200.0), Some(InstanceId(1)), &board);
            engine.pointer_move(Point::new(0.0, y), &mut board, &mut z);
            engine.pointer_up(&mut board);
            assert_eq!(board.get(2).rect.origin(), Point::new(900.0, y));
        }
    }

    #[test]
    fn test_snap_to_grid_disabled() {
        let p = Point::new(13.3, 7.7);
        assert_eq!(snap_to_grid(p, 1.0), p);
        assert_eq!(snap_to_grid(p, 10.0), Point::new(10.0, 10.0));
    }
}
