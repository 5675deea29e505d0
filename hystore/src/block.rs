use either::Either;
use smallvec::SmallVec;

use crate::{
    error::{Error, StoreResult},
    gaps::{GapCache, GapSlot},
    node::{BlockId, GAP_HEADER_SIZE, Node, NodeRef, NodeType, OPERAND_SIZE, TAG_SIZE},
};

/// Cell whose gap sub-chain holds the nodes of a block's chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Anchor {
    pub block: BlockId,
    pub offset: u32,
}

/// Fixed-capacity byte buffer holding a run of cells.
///
/// Layout of a cell: gap header (4 bytes, see [`GapSlot`]), tag (1 byte), payload (size
/// depends on the tag). The buffer never grows past `capacity`; once a cell does not fit, the
/// owning list chains a new block instead.
#[derive(Debug)]
pub(crate) struct Block {
    bytes: Vec<u8>,
    capacity: usize,
    pub full: bool,
    // Block of this chain that accepted the last insertion, only meaningful on chain heads
    pub resume: Option<BlockId>,
    pub next: Option<BlockId>,
    // Position of this block in its chain, the head is 0
    pub chain_index: u32,
    pub anchor: Option<Anchor>,
    pub gaps: GapCache,
}

impl Block {
    pub fn new(capacity: usize, chain_index: u32, anchor: Option<Anchor>) -> StoreResult<Self> {
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(capacity)
            .map_err(|_| Error::AllocationFailure {
                requested: capacity,
            })?;

        Ok(Self {
            bytes,
            capacity,
            full: false,
            resume: None,
            next: None,
            chain_index,
            anchor,
            gaps: GapCache::default(),
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[cfg(test)]
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
    }

    /// Occupied bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[inline]
    pub fn fits(&self, cell_size: usize) -> bool {
        self.bytes.len() + cell_size <= self.capacity
    }

    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Append a cell with an absent gap. Returns the offset of the cell.
    ///
    /// The caller must have checked [`Block::fits`].
    pub fn push_cell(&mut self, node: &Node) -> u32 {
        debug_assert!(self.fits(node.type_().cell_size()), "cell does not fit");

        let offset = self.bytes.len() as u32;
        self.bytes
            .extend_from_slice(&GapSlot::Absent.encode().to_le_bytes());
        self.bytes.push(node.type_() as u8);
        match *node {
            Node::Constant(value) => self.bytes.extend_from_slice(&value.to_le_bytes()),
            Node::Add { lhs, rhs } => {
                for operand in [lhs, rhs] {
                    self.bytes.extend_from_slice(&operand.block.to_le_bytes());
                    self.bytes.extend_from_slice(&operand.offset.to_le_bytes());
                }
            }
        }
        offset
    }

    /// Bulk-append raw cells copied from another block.
    pub fn extend_raw(&mut self, cells: &[u8]) {
        debug_assert!(self.fits(cells.len()), "raw cells do not fit");
        self.bytes.extend_from_slice(cells);
    }

    #[inline]
    fn read_u32(&self, at: usize) -> u32 {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&self.bytes[at..at + 4]);
        u32::from_le_bytes(raw)
    }

    #[inline]
    fn write_u32(&mut self, at: usize, value: u32) {
        self.bytes[at..at + 4].copy_from_slice(&value.to_le_bytes());
    }

    #[inline]
    pub fn tag_at(&self, offset: u32) -> u8 {
        self.bytes[offset as usize + GAP_HEADER_SIZE]
    }

    /// Decode the tag of the cell at `offset`.
    #[inline]
    pub fn type_at(&self, offset: u32) -> StoreResult<NodeType> {
        NodeType::from_tag(self.tag_at(offset))
    }

    /// Size of the cell at `offset`.
    ///
    /// Cells are only written by [`Block::push_cell`] and [`Block::extend_raw`] (which copies
    /// cells written by the former), an unknown tag means the buffer is corrupted.
    #[inline]
    pub fn cell_len(&self, offset: u32) -> usize {
        match self.type_at(offset) {
            Ok(ty) => ty.cell_size(),
            Err(err) => unreachable!("{err}"),
        }
    }

    #[inline]
    pub fn gap_at(&self, offset: u32) -> GapSlot {
        GapSlot::decode(self.read_u32(offset as usize))
    }

    #[inline]
    pub fn set_gap(&mut self, offset: u32, gap: GapSlot) {
        self.write_u32(offset as usize, gap.encode());
    }

    /// Raw operand locations `(block, offset)` of the cell at `offset`.
    pub fn operands_at(&self, offset: u32) -> StoreResult<SmallVec<[(BlockId, u32); 2]>> {
        let ty = self.type_at(offset)?;
        let base = offset as usize + GAP_HEADER_SIZE + TAG_SIZE;
        Ok((0..ty.arity())
            .map(|i| {
                let at = base + i * OPERAND_SIZE;
                (self.read_u32(at), self.read_u32(at + 4))
            })
            .collect())
    }

    /// Overwrite operand `index` of the cell at `offset`.
    pub fn set_operand(&mut self, offset: u32, index: usize, block: BlockId, target: u32) {
        let at = offset as usize + GAP_HEADER_SIZE + TAG_SIZE + index * OPERAND_SIZE;
        self.write_u32(at, block);
        self.write_u32(at + 4, target);
    }

    /// Decode the node stored at `offset`, stamping operand handles with `generation`.
    pub fn decode(&self, offset: u32, generation: u32) -> StoreResult<Node> {
        let base = offset as usize + GAP_HEADER_SIZE + TAG_SIZE;
        match self.type_at(offset)? {
            NodeType::Constant => {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(&self.bytes[base..base + 8]);
                Ok(Node::Constant(i64::from_le_bytes(raw)))
            }
            NodeType::Add => {
                let operands = self.operands_at(offset)?;
                let [(lb, lo), (rb, ro)] = [operands[0], operands[1]];
                Ok(Node::Add {
                    lhs: NodeRef::new(generation, lb, lo),
                    rhs: NodeRef::new(generation, rb, ro),
                })
            }
        }
    }

    /// Offsets of every cell, in address order.
    pub fn cells(&self) -> impl Iterator<Item = u32> + '_ {
        let mut finger = 0u32;
        std::iter::from_fn(move || {
            if finger as usize >= self.bytes.len() {
                return None;
            }
            let current = finger;
            finger += self.cell_len(current) as u32;
            Some(current)
        })
    }

    /// Record that the cell at `offset` now carries a gap.
    pub fn register_gap(&mut self, offset: u32, gap: BlockId) {
        debug_assert!(self.gap_at(offset).is_absent(), "cell already has a gap");
        self.set_gap(offset, GapSlot::Gap(gap));
        self.gaps.add(offset);
    }

    /// Gap sub-chains attached to cells of this block.
    ///
    /// Served from the gap cache while it holds every gap, otherwise by scanning all cells.
    pub fn gap_blocks(&self) -> impl Iterator<Item = BlockId> + '_ {
        if self.gaps.overflowed() {
            Either::Left(self.cells().filter_map(|offset| self.gap_at(offset).block()))
        } else {
            Either::Right(
                self.gaps
                    .cached()
                    .iter()
                    .filter_map(|&offset| self.gap_at(offset).block()),
            )
        }
    }
}
