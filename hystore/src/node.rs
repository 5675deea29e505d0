//! Node kinds and the handles used to address them.
//!
//! Role
//! - [`NodeType`] is the closed set of tags a cell may carry. The byte size of a cell is a pure
//!   function of its tag, see [`NodeType::cell_size`].
//! - [`Node`] is the decoded, typed form of a cell. It is what callers hand to
//!   [`NodeList::insert`](crate::list::NodeList::insert) and what [`NodeList::get`](crate::list::NodeList::get)
//!   returns.
//! - [`NodeRef`] and [`ChainRef`] are opaque, copyable handles. They stay valid until the next
//!   [`flatten`](crate::list::NodeList::flatten) of the list that produced them.
use std::fmt;

use smallvec::SmallVec;
use strum::{EnumIter, FromRepr};

use crate::error::{Error, StoreResult};

/// Index of a block inside the block table of a list.
pub type BlockId = u32;

/// Bytes taken by the gap header that precedes every node payload.
pub const GAP_HEADER_SIZE: usize = 4;

/// Bytes taken by the tag that starts every node payload.
pub const TAG_SIZE: usize = 1;

/// Bytes taken by an encoded operand reference (block + offset).
pub(crate) const OPERAND_SIZE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, FromRepr)]
#[repr(u8)]
pub enum NodeType {
    // Leaf
    Constant,

    // Binary
    Add,
}

impl NodeType {
    /// Size of the payload that follows the tag byte.
    #[inline]
    pub const fn payload_size(self) -> usize {
        match self {
            NodeType::Constant => 8,
            NodeType::Add => 2 * OPERAND_SIZE,
        }
    }

    /// Size of a whole cell (gap header, tag and payload) holding a node of this type.
    #[inline]
    pub const fn cell_size(self) -> usize {
        GAP_HEADER_SIZE + TAG_SIZE + self.payload_size()
    }

    /// Decode a raw tag byte.
    pub fn from_tag(tag: u8) -> StoreResult<Self> {
        NodeType::from_repr(tag).ok_or(Error::UnknownVariant { tag })
    }

    /// Number of operands a node of this type references.
    #[inline]
    pub const fn arity(self) -> usize {
        match self {
            NodeType::Constant => 0,
            NodeType::Add => 2,
        }
    }
}

/// Size of a cell given its raw tag byte.
pub fn size_of_tag(tag: u8) -> StoreResult<usize> {
    NodeType::from_tag(tag).map(NodeType::cell_size)
}

/// Handle to a node stored in a [`NodeList`](crate::list::NodeList).
///
/// Handles are only produced by completed insertions, so any handle you hold refers to a node
/// that is already committed. They are invalidated by a flatten; using one afterwards yields
/// [`Error::StaleHandle`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef {
    pub(crate) generation: u32,
    pub(crate) block: BlockId,
    pub(crate) offset: u32,
}

impl NodeRef {
    pub(crate) fn new(generation: u32, block: BlockId, offset: u32) -> Self {
        Self {
            generation,
            block,
            offset,
        }
    }

    /// Generation of the list this handle was created in.
    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}:{}@{}", self.block, self.offset, self.generation)
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Handle to a chain of blocks accepting appends: the root chain or a gap sub-chain.
///
/// Like [`NodeRef`], invalidated by a flatten; using one afterwards yields [`Error::StaleChain`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainRef {
    pub(crate) generation: u32,
    pub(crate) head: BlockId,
}

impl fmt::Debug for ChainRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chain#{}@{}", self.head, self.generation)
    }
}

impl fmt::Display for ChainRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl ChainRef {
    /// Generation of the list this handle was created in.
    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

/// Decoded node.
///
/// Operands are plain handles; there is no way to reference a node that has not been inserted
/// yet, since handles are only returned by completed insertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Node {
    Constant(i64),
    Add { lhs: NodeRef, rhs: NodeRef },
}

impl Node {
    #[inline]
    pub fn constant(value: i64) -> Self {
        Node::Constant(value)
    }

    #[inline]
    pub fn add(lhs: NodeRef, rhs: NodeRef) -> Self {
        Node::Add { lhs, rhs }
    }

    /// Return the tag identifying the kind of this node.
    #[inline]
    pub fn type_(&self) -> NodeType {
        match self {
            Node::Constant(_) => NodeType::Constant,
            Node::Add { .. } => NodeType::Add,
        }
    }

    /// Same as [`Node::type_`]
    #[inline]
    pub fn r#type(&self) -> NodeType {
        self.type_()
    }

    /// Operands in left-to-right order.
    pub fn operands(&self) -> SmallVec<[NodeRef; 2]> {
        match *self {
            Node::Constant(_) => SmallVec::new(),
            Node::Add { lhs, rhs } => smallvec::smallvec![lhs, rhs],
        }
    }
}
