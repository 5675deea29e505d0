//! Gap slots and the per-block gap cache.
//!
//! Every cell starts with a gap header. When present, the gap names a sub-chain whose nodes are
//! logically ordered right before the node of that cell. A block also remembers the offsets of
//! its first [`GAP_CACHE_CAPACITY`] gapped cells so that size accounting does not have to scan
//! every cell. Once more gaps than that have been registered, enumeration falls back to a full
//! scan of the block; the result is the same, only slower.
use crate::node::BlockId;

/// Number of gapped cells a block remembers before falling back to scanning.
pub const GAP_CACHE_CAPACITY: usize = 8;

/// Content of a cell's gap header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GapSlot {
    #[default]
    Absent,
    Gap(BlockId),
}

impl GapSlot {
    /// Header encoding: `0` is absent, `n` is block `n - 1`.
    #[inline]
    pub(crate) fn encode(self) -> u32 {
        match self {
            GapSlot::Absent => 0,
            GapSlot::Gap(block) => block + 1,
        }
    }

    #[inline]
    pub(crate) fn decode(raw: u32) -> Self {
        match raw {
            0 => GapSlot::Absent,
            n => GapSlot::Gap(n - 1),
        }
    }

    #[inline]
    pub fn block(self) -> Option<BlockId> {
        match self {
            GapSlot::Absent => None,
            GapSlot::Gap(block) => Some(block),
        }
    }

    #[inline]
    pub fn is_absent(self) -> bool {
        matches!(self, GapSlot::Absent)
    }
}

/// Bounded list of the offsets of gapped cells in one block.
#[derive(Debug, Clone, Default)]
pub(crate) struct GapCache {
    offsets: [u32; GAP_CACHE_CAPACITY],
    // Total number of gaps registered, may exceed the capacity
    count: usize,
}

impl GapCache {
    pub fn add(&mut self, offset: u32) {
        if self.count < GAP_CACHE_CAPACITY {
            self.offsets[self.count] = offset;
        }
        self.count += 1;
    }

    #[inline]
    pub fn overflowed(&self) -> bool {
        self.count > GAP_CACHE_CAPACITY
    }

    /// Number of gaps registered, cached or not.
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    /// Cached offsets. Only complete when the cache has not overflowed.
    #[inline]
    pub fn cached(&self) -> &[u32] {
        &self.offsets[..self.count.min(GAP_CACHE_CAPACITY)]
    }
}
