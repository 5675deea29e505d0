//! Read-only, flat snapshots that can be shared between threads.
//!
//! A [`NodeList`] has a single owner while it is being built. Once construction is over,
//! [`NodeList::freeze`] flattens it and wraps it in a [`FrozenNodeList`], which only exposes
//! the `&self` API (traversal, decoding, rendering). Wrap it in an `Arc` to hand it to readers.
use std::ops::Deref;

use crate::{error::StoreResult, list::NodeList};

/// Immutable flat list. Dereferences to [`NodeList`] for read access.
pub struct FrozenNodeList {
    list: NodeList,
}

impl NodeList {
    /// Flatten (unless already flat) and freeze the list.
    ///
    /// The list is consumed, on error it is dropped. Call [`NodeList::flatten`] first to keep the
    /// list around on failure; freezing a flat list never fails.
    pub fn freeze(mut self) -> StoreResult<FrozenNodeList> {
        if !self.is_flat() {
            self.flatten()?;
        }
        Ok(FrozenNodeList { list: self })
    }
}

impl FrozenNodeList {
    /// Get the mutable list back. Handles stay valid.
    pub fn thaw(self) -> NodeList {
        self.list
    }
}

impl Deref for FrozenNodeList {
    type Target = NodeList;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.list
    }
}

impl AsRef<NodeList> for FrozenNodeList {
    #[inline]
    fn as_ref(&self) -> &NodeList {
        &self.list
    }
}
