//! Hystore: gap-buffered arena storage for IR nodes.
//!
//! Nodes (constants and additions) are encoded into fixed-capacity byte blocks. A
//! [`NodeList`](list::NodeList) grows by chaining blocks, accepts insertions *before* any
//! existing node through per-cell gap sub-chains (no byte is ever moved), and can be flattened
//! back into one contiguous, gap-free block whenever cheap repeated scanning matters more than
//! cheap insertion.
//!
//! Encoding shape
//!  - A cell is a 4-byte gap header, a 1-byte tag and a payload whose size is fixed by the tag.
//!  - Operands are stored as `(block, offset)` handles into the same list; a flatten rewrites them
//!    through a forwarding table.
//!  - Operands are always ordered before the node referencing them, which is what lets a flatten
//!    relocate everything in a single forward pass.
//!
//! Example
//! ```
//! use hystore::prelude::*;
//!
//! let mut list = NodeList::with_config(StoreConfig::uniform(1024)).unwrap();
//! let a = list.insert(Node::constant(1)).unwrap();
//! let b = list.insert(Node::constant(2)).unwrap();
//! list.insert(Node::constant(3)).unwrap();
//!
//! // [1, 2, 3] -> [1, 99, 2, 3]
//! let gap = list.insert_before(b).unwrap();
//! list.insert_into(gap, Node::constant(99)).unwrap();
//! let sum = list.insert_into(gap, Node::add(a, a)).unwrap();
//! assert_eq!(list.render(sum).unwrap(), "1 + 1");
//!
//! list.flatten().unwrap();
//! assert!(list.is_flat());
//! let rendered: Vec<_> = list.iter().map(|n| list.render(n).unwrap()).collect();
//! assert_eq!(rendered, ["1", "99", "1 + 1", "2", "3"]);
//! ```

pub(crate) mod block;
/// Block sizing configuration.
pub mod config;
/// Logical-order traversal.
pub mod cursor;
/// Error type shared by every fallible operation.
pub mod error;
/// Compaction into a single block.
pub mod flatten;
/// Read-only flat snapshots.
pub mod frozen;
/// Gap slots and gap cache.
pub mod gaps;
/// The node list itself: insertion, gaps, accounting.
pub mod list;
/// Node kinds and handles.
pub mod node;
/// Rendering and debug dumps.
pub mod render;

pub mod prelude {
    //! Convenient re-exports for end users.
    pub use crate::config::StoreConfig;
    pub use crate::cursor::Cursor;
    pub use crate::error::{Error, StoreResult};
    pub use crate::frozen::FrozenNodeList;
    pub use crate::list::NodeList;
    pub use crate::node::{ChainRef, Node, NodeRef, NodeType};
}
