//! The node list: a table of blocks organised into chains and gaps.
//!
//! Role
//! - Owns every block of the structure in a single table indexed by block id. The root chain
//!   starts at block `0`; every gap sub-chain starts at the block named by a cell's gap header.
//! - Appends go through [`NodeList::insert`] (root chain) or [`NodeList::insert_into`] (any
//!   chain, typically one returned by [`NodeList::insert_before`]).
//! - Reading happens through [`NodeList::iter`] (logical order) and [`NodeList::get`].
//!
//! Ordering
//! - Operands must be logically ordered before the node that references them. Appends to the
//!   root chain satisfy this trivially since every handle comes from an earlier insertion; appends
//!   into a gap are checked against the position of the gap, see [`NodeList::insert_into`].
//!
//! Performance
//! - Appends are amortized O(1): each chain head caches the block that accepted the last insert,
//!   so chained growth never rescans the chain from the start.
//! - `insert_before` is O(1) and never moves existing bytes.
use std::{
    cmp::Ordering as CmpOrdering,
    sync::atomic::{AtomicU32, Ordering},
};

use log::debug;
use smallvec::SmallVec;

use crate::{
    block::{Anchor, Block},
    config::StoreConfig,
    cursor::Cursor,
    error::{Error, StoreResult},
    node::{BlockId, ChainRef, Node, NodeRef},
};

/// Id of the head of the root chain.
pub(crate) const ROOT: BlockId = 0;

static NEXT_GENERATION: AtomicU32 = AtomicU32::new(1);

/// Draw a generation no other list (or earlier state of a list) has used.
pub(crate) fn fresh_generation() -> u32 {
    NEXT_GENERATION.fetch_add(1, Ordering::Relaxed)
}

// Position of a node as seen from the root: one (chain index, offset) pair per nesting level.
type LogicalPath = SmallVec<[(u32, u32); 8]>;

/// Growable, gap-insertable storage for IR nodes.
///
/// Example
/// ```
/// use hystore::prelude::*;
///
/// let mut list = NodeList::new().unwrap();
/// let two = list.insert(Node::constant(2)).unwrap();
/// let three = list.insert(Node::constant(3)).unwrap();
/// let sum = list.insert(Node::add(two, three)).unwrap();
///
/// // Put a node logically before `two` without moving anything
/// let gap = list.insert_before(two).unwrap();
/// list.insert_into(gap, Node::constant(1)).unwrap();
///
/// let rendered: Vec<_> = list.iter().map(|n| list.render(n).unwrap()).collect();
/// assert_eq!(rendered, ["1", "2", "3", "2 + 3"]);
/// assert_eq!(list.render(sum).unwrap(), "2 + 3");
/// ```
pub struct NodeList {
    pub(crate) blocks: Vec<Block>,
    pub(crate) generation: u32,
    pub(crate) config: StoreConfig,
}

impl NodeList {
    /// Create an empty list with the default [`StoreConfig`].
    pub fn new() -> StoreResult<Self> {
        Self::with_config(StoreConfig::default())
    }

    /// Create an empty list. The root block is allocated eagerly.
    pub fn with_config(config: StoreConfig) -> StoreResult<Self> {
        let root = Block::new(config.block_capacity, 0, None)?;
        Ok(Self {
            blocks: vec![root],
            generation: fresh_generation(),
            config,
        })
    }

    /// Generation stamped on every handle this list currently hands out.
    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation
    }

    #[inline]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Handle to the root chain.
    #[inline]
    pub fn root(&self) -> ChainRef {
        ChainRef {
            generation: self.generation,
            head: ROOT,
        }
    }

    pub(crate) fn check_node(&self, node: NodeRef) -> StoreResult<()> {
        if node.generation != self.generation {
            return Err(Error::StaleHandle {
                handle: node,
                generation: self.generation,
            });
        }
        debug_assert!(
            self.blocks
                .get(node.block as usize)
                .is_some_and(|b| (node.offset as usize) < b.len()),
            "Handle {node} is out of bounds"
        );
        Ok(())
    }

    fn check_chain(&self, chain: ChainRef) -> StoreResult<()> {
        if chain.generation != self.generation {
            return Err(Error::StaleChain {
                chain,
                generation: self.generation,
            });
        }
        debug_assert_eq!(self.blocks[chain.head as usize].chain_index, 0);
        Ok(())
    }

    /// Append a node to the root chain.
    #[inline]
    pub fn insert(&mut self, node: Node) -> StoreResult<NodeRef> {
        self.insert_into(self.root(), node)
    }

    /// Append a node to the end of `chain`.
    ///
    /// Every operand of `node` must be logically ordered before the insertion point. For the
    /// root chain this always holds; for a gap sub-chain the insertion point sits right before the
    /// cell owning the gap (and after everything already in the gap), so operands stored after
    /// that cell are rejected with [`Error::InvariantViolation`].
    ///
    /// On error nothing is modified.
    pub fn insert_into(&mut self, chain: ChainRef, node: Node) -> StoreResult<NodeRef> {
        self.check_chain(chain)?;
        for operand in node.operands() {
            self.check_node(operand)?;
            self.check_precedes(operand, chain.head)?;
        }

        let block = self.reserve(chain.head, node.type_().cell_size())?;
        let offset = self.blocks[block as usize].push_cell(&node);
        Ok(NodeRef::new(self.generation, block, offset))
    }

    /// Find a block of the chain starting at `head` with room for `size` bytes, chaining a new
    /// block at the tail if none has room.
    fn reserve(&mut self, head: BlockId, size: usize) -> StoreResult<BlockId> {
        // Every block before the cached one is already full
        let mut current = self.blocks[head as usize].resume.unwrap_or(head);
        let mut exhausted: SmallVec<[BlockId; 4]> = SmallVec::new();

        loop {
            let block = &self.blocks[current as usize];
            if !block.full && block.fits(size) {
                break;
            }
            let next = block.next;
            exhausted.push(current);
            current = match next {
                Some(next) => next,
                None => self.chain_block(current, size)?,
            };
        }

        for id in exhausted {
            self.blocks[id as usize].full = true;
        }
        self.blocks[head as usize].resume = Some(current);
        Ok(current)
    }

    /// Allocate a block after `tail`, large enough for at least one cell of `size` bytes.
    fn chain_block(&mut self, tail: BlockId, size: usize) -> StoreResult<BlockId> {
        let (chain_index, anchor) = {
            let tail = &self.blocks[tail as usize];
            (tail.chain_index + 1, tail.anchor)
        };
        let default = match anchor {
            Some(_) => self.config.gap_capacity,
            None => self.config.block_capacity,
        };
        let capacity = default.max(size);

        let id = self.push_block(Block::new(capacity, chain_index, anchor)?)?;
        self.blocks[tail as usize].next = Some(id);
        debug!(
            "Chained block {id} ({capacity} bytes) after block {tail} at chain position {chain_index}"
        );
        Ok(id)
    }

    fn push_block(&mut self, block: Block) -> StoreResult<BlockId> {
        let id = self.blocks.len();
        self.blocks
            .try_reserve(1)
            .map_err(|_| Error::AllocationFailure {
                requested: std::mem::size_of::<Block>(),
            })?;
        self.blocks.push(block);
        Ok(id as BlockId)
    }

    /// Return the gap sub-chain of the cell holding `at`, creating it if needed.
    ///
    /// Nodes appended to the returned chain are logically ordered right before `at` (and after
    /// any node previously inserted before `at`). No existing byte is moved.
    pub fn insert_before(&mut self, at: NodeRef) -> StoreResult<ChainRef> {
        self.check_node(at)?;

        let owner = &self.blocks[at.block as usize];
        if let Some(head) = owner.gap_at(at.offset).block() {
            return Ok(ChainRef {
                generation: self.generation,
                head,
            });
        }

        let anchor = Anchor {
            block: at.block,
            offset: at.offset,
        };
        let gap = Block::new(self.config.gap_capacity, 0, Some(anchor))?;
        let head = self.push_block(gap)?;
        self.blocks[at.block as usize].register_gap(at.offset, head);
        debug!("Opened gap block {head} before {at}");

        Ok(ChainRef {
            generation: self.generation,
            head,
        })
    }

    fn logical_path(&self, mut block: BlockId, mut offset: u32) -> LogicalPath {
        let mut path = LogicalPath::new();
        loop {
            let b = &self.blocks[block as usize];
            path.push((b.chain_index, offset));
            match b.anchor {
                Some(anchor) => {
                    block = anchor.block;
                    offset = anchor.offset;
                }
                None => break,
            }
        }
        path.reverse();
        path
    }

    /// Whether the node at path `a` is logically ordered strictly before the node at path `b`.
    fn path_precedes(a: &LogicalPath, b: &LogicalPath) -> bool {
        for (x, y) in a.iter().zip(b.iter()) {
            match x.cmp(y) {
                CmpOrdering::Equal => continue,
                ord => return ord == CmpOrdering::Less,
            }
        }
        // One path is a prefix of the other: the longer one lives in a gap of the cell the
        // shorter one ends on, hence comes first
        a.len() > b.len()
    }

    fn check_precedes(&self, operand: NodeRef, head: BlockId) -> StoreResult<()> {
        let Some(anchor) = self.blocks[head as usize].anchor else {
            return Ok(());
        };

        // Appending to a gap lands after everything in the gap, right before the anchor cell
        let mut insertion = self.logical_path(anchor.block, anchor.offset);
        insertion.push((u32::MAX, u32::MAX));

        let operand_path = self.logical_path(operand.block, operand.offset);
        if Self::path_precedes(&operand_path, &insertion) {
            Ok(())
        } else {
            Err(Error::InvariantViolation {
                operand,
                consumer: NodeRef::new(self.generation, anchor.block, anchor.offset),
            })
        }
    }

    /// Decode the node behind `node`.
    pub fn get(&self, node: NodeRef) -> StoreResult<Node> {
        self.check_node(node)?;
        self.blocks[node.block as usize].decode(node.offset, self.generation)
    }

    /// Traverse every node in logical order.
    #[inline]
    pub fn iter(&self) -> Cursor<'_> {
        Cursor::new(self)
    }

    /// Node at logical position `index`, if any.
    pub fn nth_node(&self, index: usize) -> Option<NodeRef> {
        self.iter().nth(index)
    }

    /// Visit every block reachable from the root through chain links and gaps.
    ///
    /// Gaps are enumerated through each block's gap cache, or by scanning the block when the cache
    /// has overflowed.
    pub(crate) fn for_each_reachable(&self, mut f: impl FnMut(BlockId, &Block)) {
        let mut stack: SmallVec<[BlockId; 16]> = SmallVec::new();
        stack.push(ROOT);
        while let Some(id) = stack.pop() {
            let block = &self.blocks[id as usize];
            f(id, block);
            stack.extend(block.gap_blocks());
            stack.extend(block.next);
        }
    }

    /// Sum of the capacities of every reachable block.
    ///
    /// This counts allocated capacity, not occupied bytes, and is what a flatten reserves for its
    /// destination block.
    pub fn total_size(&self) -> usize {
        let mut total = 0;
        self.for_each_reachable(|_, block| total += block.capacity());
        total
    }

    /// Number of blocks reachable from the root.
    pub fn reachable_blocks(&self) -> usize {
        let mut count = 0;
        self.for_each_reachable(|_, _| count += 1);
        count
    }

    /// Number of blocks owned by the list.
    #[inline]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Number of gaps attached to cells, empty gaps included.
    pub fn gap_count(&self) -> usize {
        let mut count = 0;
        self.for_each_reachable(|_, block| count += block.gaps.len());
        count
    }

    /// Number of stored nodes.
    pub fn len(&self) -> usize {
        self.blocks.iter().map(|b| b.cells().count()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(Block::is_empty)
    }

    /// Bytes occupied by cells, across every block.
    pub fn occupied_bytes(&self) -> usize {
        self.blocks.iter().map(Block::len).sum()
    }

    /// Whether the list is a single block, hence holds no gap either.
    pub fn is_flat(&self) -> bool {
        self.blocks.len() == 1
    }
}

impl<'a> IntoIterator for &'a NodeList {
    type Item = NodeRef;
    type IntoIter = Cursor<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
