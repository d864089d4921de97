use std::sync::Arc;

use crate::hash::Hash256;

/// A leaf's content: an opaque payload plus the 256-bit tag that identifies
/// it (a transaction id or an account-state key, depending on leaf type).
///
/// Shared by reference across node versions (construct-clone keeps the same
/// `Arc`), but never mutated in place — `set-item` on a node always installs
/// a brand new `Item`, so a clone's `get-item` can never observe a sibling's
/// later edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    tag: Hash256,
    payload: Arc<[u8]>,
}

impl Item {
    pub fn new(tag: Hash256, payload: impl Into<Arc<[u8]>>) -> Self {
        Self {
            tag,
            payload: payload.into(),
        }
    }

    pub fn tag(&self) -> &Hash256 {
        &self.tag
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// A deep copy: a fresh `Arc` with its own backing allocation, not a
    /// clone of the reference. Used by `get-item`, which must return a copy
    /// the caller can't use to alias the node's internal storage.
    pub fn deep_copy(&self) -> Self {
        Self {
            tag: self.tag,
            payload: Arc::from(self.payload.as_ref()),
        }
    }
}
