//! Monotonic z-order allocation.
//!
//! Every element raised on the table (placed, drawn, lifted by a drag)
//! receives the next value from a single allocator owned by the table
//! session and lent to the drag engine, so later actions always land on
//! top of earlier ones.

use serde::{Deserialize, Serialize};

/// Hands out strictly increasing z-order values.
///
/// ```
/// use rust_tabletop::core::ZOrderAllocator;
///
/// let mut z = ZOrderAllocator::new(1000);
/// assert_eq!(z.next_value(), 1001);
/// assert_eq!(z.next_value(), 1002);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZOrderAllocator {
    current: u64,
}

impl ZOrderAllocator {
    /// Create an allocator whose first value is `base + 1`.
    #[must_use]
    pub fn new(base: u64) -> Self {
        Self { current: base }
    }

    /// Allocate the next z-order value.
    pub fn next_value(&mut self) -> u64 {
        self.current += 1;
        self.current
    }

    /// The most recently allocated value (or the base).
    #[must_use]
    pub fn current(&self) -> u64 {
        self.current
    }

    /// Make sure future values sort above an externally restored `z`.
    pub fn observe(&mut self, z: u64) {
        self.current = self.current.max(z);
    }
}
