//! A flat, in-memory id → node map. Not a trie: no path traversal, no
//! nibble consumption, no proof generation. It exists only so tests and the
//! `demos/` walkthrough can exercise decode → mutate → encode → store →
//! fetch cycles the way the enclosing (out-of-scope) trie would.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::PreconditionError;
use crate::{Node, NodeId};

/// Thread-safe store keyed by [`NodeId`]. Mirrors `InMemoryTrieDB`'s
/// `Arc<Mutex<HashMap<_, _>>>` shape and its lock-poisoning-to-error
/// translation, specialized to hold live [`Node`] values instead of raw
/// bytes since the node engine, not a byte codec, is what this crate tests.
#[derive(Debug, Default, Clone)]
pub struct NodeStore {
    inner: Arc<Mutex<HashMap<NodeId, Node>>>,
}

impl NodeStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn get(&self, id: NodeId) -> Result<Option<Node>, PreconditionError> {
        Ok(self
            .inner
            .lock()
            .map_err(|_| PreconditionError::LockPoisoned)?
            .get(&id)
            .cloned())
    }

    pub fn put(&self, id: NodeId, node: Node) -> Result<(), PreconditionError> {
        self.inner
            .lock()
            .map_err(|_| PreconditionError::LockPoisoned)?
            .insert(id, node);
        Ok(())
    }

    pub fn put_batch(&self, nodes: Vec<(NodeId, Node)>) -> Result<(), PreconditionError> {
        let mut store = self.inner.lock().map_err(|_| PreconditionError::LockPoisoned)?;
        for (id, node) in nodes {
            store.insert(id, node);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
