//! Logical-order traversal over a [`NodeList`].
//!
//! The logical sequence of a chain is: for each block of the chain, for each cell in address
//! order, first the whole logical sequence of the cell's gap (if any), then the cell's own node.
//! This is a pre-order walk where each cell has its gap as first child. The cursor keeps an
//! explicit stack of suspended outer positions instead of recursing, so arbitrarily deep gap
//! nesting costs O(depth) memory.
//!
//! Example
//! ```
//! use hystore::prelude::*;
//!
//! let mut list = NodeList::new().unwrap();
//! let a = list.insert(Node::constant(1)).unwrap();
//! list.insert(Node::constant(3)).unwrap();
//! let gap = list.insert_before(a).unwrap();
//! list.insert_into(gap, Node::constant(0)).unwrap();
//!
//! let cursor = list.iter();
//! assert_eq!(cursor.depth(), 1); // inside the gap of `a`
//! let values: Vec<_> = cursor.map(|n| list.render(n).unwrap()).collect();
//! assert_eq!(values, ["0", "1", "3"]);
//! ```
use std::iter::FusedIterator;

use smallvec::SmallVec;

use crate::{
    list::{NodeList, ROOT},
    node::{BlockId, NodeRef},
};

#[derive(Debug, Clone)]
enum CursorState {
    Positioned {
        block: BlockId,
        finger: u32,
        // Cells whose gap is being traversed, innermost last
        suspended: SmallVec<[(BlockId, u32); 8]>,
    },
    Exhausted,
}

/// Stateful iterator over the nodes of a list, in logical order.
///
/// Yields [`NodeRef`] handles; pass one to [`NodeList::insert_before`] (once the cursor is
/// dropped) to insert nodes right before it.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    list: &'a NodeList,
    state: CursorState,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(list: &'a NodeList) -> Self {
        let state = match Self::first_block(list, ROOT) {
            Some(block) => CursorState::Positioned {
                block,
                finger: 0,
                suspended: SmallVec::new(),
            },
            None => CursorState::Exhausted,
        };
        let mut cursor = Self { list, state };
        cursor.descend();
        cursor
    }

    /// First non-empty block of the chain starting at `block`.
    fn first_block(list: &NodeList, block: BlockId) -> Option<BlockId> {
        let mut current = Some(block);
        while let Some(id) = current {
            let b = &list.blocks[id as usize];
            if !b.is_empty() {
                return Some(id);
            }
            current = b.next;
        }
        None
    }

    /// Enter gaps attached to the current cell until reaching a cell whose gap is absent or empty.
    fn descend(&mut self) {
        let CursorState::Positioned {
            block,
            finger,
            suspended,
        } = &mut self.state
        else {
            return;
        };

        while let Some(gap) = self.list.blocks[*block as usize].gap_at(*finger).block() {
            let Some(inner) = Self::first_block(self.list, gap) else {
                break;
            };
            suspended.push((*block, *finger));
            *block = inner;
            *finger = 0;
        }
    }

    /// Node under the cursor, `None` once exhausted.
    #[inline]
    pub fn current(&self) -> Option<NodeRef> {
        match self.state {
            CursorState::Positioned { block, finger, .. } => {
                Some(NodeRef::new(self.list.generation, block, finger))
            }
            CursorState::Exhausted => None,
        }
    }

    /// Number of gaps the cursor is currently nested in.
    #[inline]
    pub fn depth(&self) -> usize {
        match &self.state {
            CursorState::Positioned { suspended, .. } => suspended.len(),
            CursorState::Exhausted => 0,
        }
    }

    #[inline]
    pub fn is_exhausted(&self) -> bool {
        matches!(self.state, CursorState::Exhausted)
    }

    /// Move to the next node in logical order. Does nothing once exhausted.
    pub fn advance(&mut self) {
        let list = self.list;
        let CursorState::Positioned {
            block,
            finger,
            suspended,
        } = &mut self.state
        else {
            return;
        };

        let current = &list.blocks[*block as usize];
        *finger += current.cell_len(*finger) as u32;
        if (*finger as usize) < current.len() {
            self.descend();
            return;
        }

        // Block exhausted, carry on with the rest of its chain
        if let Some(next) = current.next.and_then(|next| Self::first_block(list, next)) {
            *block = next;
            *finger = 0;
            self.descend();
            return;
        }

        // Chain exhausted, resume the cell whose gap we were in. Its gap is done, so no descent.
        match suspended.pop() {
            Some((outer, at)) => {
                *block = outer;
                *finger = at;
            }
            None => self.state = CursorState::Exhausted,
        }
    }
}

impl<'a> Iterator for Cursor<'a> {
    type Item = NodeRef;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current()?;
        self.advance();
        Some(current)
    }
}

impl<'a> FusedIterator for Cursor<'a> {}
