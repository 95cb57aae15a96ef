//! Table configuration.
//!
//! `TableConfig` collects every tunable constant of the table engine:
//! gesture thresholds, snapping, zoom limits, element sizes and the
//! recursion guards of the resolution engines. It deserializes from JSON
//! with every field optional, so a settings file only lists overrides.
//!
//! ```
//! use rust_tabletop::core::TableConfig;
//!
//! let config = TableConfig::default().with_grid_size(20.0);
//! assert!(config.grid_enabled());
//!
//! let parsed: TableConfig = serde_json::from_str(r#"{ "grid_size": 10.0 }"#).unwrap();
//! assert_eq!(parsed.grid_size, 10.0);
//! assert_eq!(parsed.drag_threshold, 5.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::spatial::{Point, Size};

/// Tunable constants for a table session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Pointer displacement (screen px) that turns a press into a drag.
    pub drag_threshold: f64,

    /// Grid pitch in table px. Values <= 1 disable grid snapping.
    pub grid_size: f64,

    /// Offset from the snap target's top-left, giving a cascading stack.
    pub snap_offset: Point,

    /// Overlap ratio above which an element joins a stack or snaps.
    pub significant_overlap: f64,

    /// Starting value of the z-order counter. The first allocation is `z_base + 1`.
    pub z_base: u64,

    /// Maximum indirection depth for special references.
    pub max_special_depth: u8,

    /// Maximum nesting depth for placeholder expansion.
    pub max_text_depth: u8,

    /// Zoom limits.
    pub min_scale: f64,
    pub max_scale: f64,

    /// Scale change per unit of wheel delta.
    pub wheel_sensitivity: f64,

    pub card_size: Size,
    pub deck_size: Size,
    pub pawn_size: Size,
    pub resource_size: Size,

    /// Where a drawn card lands, relative to its deck.
    pub draw_offset: Point,

    /// Horizontal gap between a deck and its auto-spawned side deck.
    pub side_deck_gap: f64,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            drag_threshold: 5.0,
            grid_size: 1.0,
            snap_offset: Point::new(12.0, 24.0),
            significant_overlap: 0.5,
            z_base: 1000,
            max_special_depth: 10,
            max_text_depth: 5,
            min_scale: 0.5,
            max_scale: 2.0,
            wheel_sensitivity: 0.001,
            card_size: Size::new(150.0, 210.0),
            deck_size: Size::new(150.0, 210.0),
            pawn_size: Size::new(40.0, 40.0),
            resource_size: Size::new(80.0, 40.0),
            draw_offset: Point::new(160.0, 0.0),
            side_deck_gap: 20.0,
        }
    }
}

impl TableConfig {
    /// Set the grid pitch.
    #[must_use]
    pub fn with_grid_size(mut self, grid_size: f64) -> Self {
        self.grid_size = grid_size;
        self
    }

    /// Set the cascading snap offset.
    #[must_use]
    pub fn with_snap_offset(mut self, offset: Point) -> Self {
        self.snap_offset = offset;
        self
    }

    /// Set the drag threshold.
    #[must_use]
    pub fn with_drag_threshold(mut self, threshold: f64) -> Self {
        self.drag_threshold = threshold;
        self
    }

    /// Set the card size used for new card instances.
    #[must_use]
    pub fn with_card_size(mut self, size: Size) -> Self {
        self.card_size = size;
        self
    }

    /// Set the deck size used for new deck instances.
    #[must_use]
    pub fn with_deck_size(mut self, size: Size) -> Self {
        self.deck_size = size;
        self
    }

    /// Is grid snapping active?
    #[must_use]
    pub fn grid_enabled(&self) -> bool {
        self.grid_size > 1.0
    }

    /// Clamp a zoom scale to the configured limits.
    #[must_use]
    pub fn clamp_scale(&self, scale: f64) -> f64 {
        scale.clamp(self.min_scale, self.max_scale)
    }
}
