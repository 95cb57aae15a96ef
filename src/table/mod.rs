//! The live table and the session controller that drives it.
//!
//! ## Key Types
//!
//! - `TableDeck`, `TableCard`, `TablePawn`, `TableResource`: live instances
//! - `Table`: every instance on the table; implements `DragSurface`
//! - `TableSnapshot`: persisted/exported table state
//! - `TableSession`: wires gestures, draws and autosave together

pub mod instance;
pub mod board;
pub mod links;
pub mod snapshot;
pub mod session;

pub use instance::{PawnShape, TableCard, TableDeck, TablePawn, TableResource};
pub use board::Table;
pub use links::{connector_lines, ConnectorLine, SideDeckLink};
pub use snapshot::{Definitions, TableSnapshot};
pub use session::{Notice, RenderedCard, TableSession};
