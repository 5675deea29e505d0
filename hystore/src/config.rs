//! Sizing knobs for a [`NodeList`](crate::list::NodeList).
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default capacity of a block, in bytes.
pub const DEFAULT_BLOCK_CAPACITY: usize = 128 * 1024;

/// Capacities used when the list allocates new blocks.
///
/// Capacities are lower bounds: a block that must hold a single cell larger than the configured
/// capacity is sized to fit that cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StoreConfig {
    /// Capacity of the root block and of blocks chained onto the root chain.
    pub block_capacity: usize,
    /// Capacity of gap sub-blocks and of blocks chained onto a gap chain.
    pub gap_capacity: usize,
}

impl StoreConfig {
    pub fn with_block_capacity(mut self, capacity: usize) -> Self {
        self.block_capacity = capacity;
        self
    }

    pub fn with_gap_capacity(mut self, capacity: usize) -> Self {
        self.gap_capacity = capacity;
        self
    }

    /// Use the same capacity for every block.
    pub fn uniform(capacity: usize) -> Self {
        Self {
            block_capacity: capacity,
            gap_capacity: capacity,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::uniform(DEFAULT_BLOCK_CAPACITY)
    }
}
