use strum::EnumIs;
use thiserror::Error;

use crate::node::{ChainRef, NodeRef};

/// Errors reported by [`NodeList`](crate::list::NodeList) operations.
///
/// None of these are retried internally. Every failing operation leaves the list exactly as it
/// was before the call.
#[derive(Debug, Clone, PartialEq, Eq, EnumIs, Error)]
pub enum Error {
    /// A block (chained, gap or flatten destination) could not be allocated.
    #[error("Failed to allocate a block of {requested} bytes.")]
    AllocationFailure { requested: usize },

    /// A cell carries a tag byte that does not name any [`NodeType`](crate::node::NodeType).
    #[error(
        "Encountered unknown node tag `{tag}`. Cells are only ever written through typed insertion, the list is corrupted."
    )]
    UnknownVariant { tag: u8 },

    /// A node references an operand that does not logically precede it.
    ///
    /// `consumer` is the node the offending insertion would precede, or the consumer itself
    /// when the violation is found while flattening.
    #[error(
        "Operand {operand} is not ordered before {consumer}. Operands must be committed before any node that references them."
    )]
    InvariantViolation { operand: NodeRef, consumer: NodeRef },

    /// A handle was produced by another list, or by this list before a flatten.
    #[error(
        "Handle {handle} does not belong to this list (current generation {generation}). Handles do not survive a flatten."
    )]
    StaleHandle { handle: NodeRef, generation: u32 },

    /// Same as [`Error::StaleHandle`], for a chain handle such as one returned by
    /// [`NodeList::insert_before`](crate::list::NodeList::insert_before).
    #[error(
        "Chain {chain} does not belong to this list (current generation {generation}). Chain handles do not survive a flatten."
    )]
    StaleChain { chain: ChainRef, generation: u32 },
}

pub type StoreResult<T> = Result<T, Error>;
