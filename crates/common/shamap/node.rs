//! Node object and serialization/hashing engine for a radix-16 Merkle trie.
//!
//! A [`Node`] is either an inner branch node holding 16 child hashes, or a
//! leaf holding one content [`Item`](item::Item). This crate owns the node
//! value, its two decoders (WIRE, PREFIX) and three encoders (HASH, PREFIX,
//! WIRE), and the four type-dependent hashing schemes that keep a node's
//! cached `hash` in agreement with its fields. The enclosing trie — insert,
//! delete, path walking, copy-on-write snapshot management across ledger
//! sequences, proof generation, and persistence — lives outside this crate.

pub mod codec;
pub mod error;
pub mod hash;
pub mod item;
mod paranoid;
pub mod store;

use codec::{DecodedBody, InputFormat, OutputFormat};
use error::{NodeDecodeError, PreconditionError};
use hash::{Hash256, ZERO_HASH};
use item::Item;

pub use store::NodeStore;

/// Position of a node within the enclosing trie (depth + path prefix, as an
/// opaque caller-supplied tag). This crate never interprets it; it's
/// carried only for identity and for use as a [`NodeStore`] key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// The three leaf content kinds. `INNER` and the transient `ERROR` scratch
/// state are not leaf kinds; they're represented at the [`Node`] level
/// instead (see [`NodeState`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeafKind {
    TxNoMeta,
    TxMeta,
    AccountState,
}

/// The node's content, once it has left the scratch state. An explicit
/// tagged enum in place of the inheritance hierarchy the reference
/// implementation uses for the same distinction.
#[derive(Debug, Clone)]
enum NodeKind {
    Inner {
        branches: [Hash256; 16],
        mask: u16,
    },
    Leaf {
        kind: LeafKind,
        item: Item,
    },
}

/// `ERROR` is not a reachable [`NodeKind`] variant. It's a distinct
/// top-level node state produced only by [`Node::construct_empty`]; every
/// other constructor and the decoder hand back a fully-formed `Ready` node
/// or an error, never a half-mutated scratch node left for the caller to
/// notice later.
#[derive(Debug, Clone)]
enum NodeState {
    Scratch,
    Ready(NodeKind),
}

/// A single node of the trie: either an inner branch node or a leaf,
/// tracking its own cached content hash.
///
/// Mutators always leave `hash` in agreement with the node's fields before
/// returning (see [`Node::recompute_hash`]); none of them invalidate it
/// lazily.
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    seq: u32,
    hash: Hash256,
    full_below: bool,
    state: NodeState,
}

impl Node {
    /// A scratch node with no content and zero hash, used only as a buffer
    /// the decoder fills in. Observing any accessor other than `id`/`seq`
    /// on a scratch node is a precondition violation.
    pub fn construct_empty(seq: u32, id: NodeId) -> Self {
        Self {
            id,
            seq,
            hash: ZERO_HASH,
            full_below: false,
            state: NodeState::Scratch,
        }
    }

    /// Deep copy of `self` under a new ledger sequence. `branches` is
    /// copied by value; a leaf's `item` is deep-copied so mutating the
    /// clone's item can never be observed through the source.
    pub fn construct_clone(&self, new_seq: u32) -> Result<Self, PreconditionError> {
        let kind = match &self.state {
            NodeState::Ready(kind) => kind.clone_deep(),
            NodeState::Scratch => {
                debug_assert!(false, "construct_clone called on a scratch node");
                return Err(PreconditionError::Scratch);
            }
        };
        Ok(Self {
            id: self.id,
            seq: new_seq,
            hash: self.hash,
            full_below: false,
            state: NodeState::Ready(kind),
        })
    }

    /// A fresh leaf. `item.payload().len() >= 12` is required; hash is
    /// computed immediately.
    pub fn construct_leaf(
        id: NodeId,
        item: Item,
        leaf_type: LeafKind,
        seq: u32,
    ) -> Result<Self, PreconditionError> {
        if item.payload().len() < 12 {
            debug_assert!(false, "fresh leaf payload shorter than 12 bytes");
            return Err(PreconditionError::PayloadTooShort);
        }
        let mut node = Self {
            id,
            seq,
            hash: ZERO_HASH,
            full_below: false,
            state: NodeState::Ready(NodeKind::Leaf {
                kind: leaf_type,
                item,
            }),
        };
        node.recompute_hash();
        Ok(node)
    }

    /// Decodes a node from `bytes` under `format`. If `expected_hash` is
    /// supplied, it's adopted without recomputation — unless paranoid-hash
    /// checking is active, in which case it's re-derived and asserted
    /// equal. Otherwise the hash is always recomputed.
    pub fn decode(
        id: NodeId,
        bytes: &[u8],
        seq: u32,
        format: InputFormat,
        expected_hash: Option<Hash256>,
    ) -> Result<Self, NodeDecodeError> {
        let decoded = codec::decode(format, bytes).inspect_err(|reason| {
            tracing::warn!(node_id = id.raw(), %reason, "node decode failed");
        })?;

        let state = match decoded {
            DecodedBody::Inner { branches } => {
                let mask = branch_mask(&branches);
                NodeKind::Inner { branches, mask }
            }
            DecodedBody::Leaf { kind, tag, payload } => NodeKind::Leaf {
                kind,
                item: Item::new(tag, payload),
            },
        };

        let mut node = Self {
            id,
            seq,
            hash: ZERO_HASH,
            full_below: false,
            state: NodeState::Ready(state),
        };

        match expected_hash {
            Some(expected) => {
                node.hash = expected;
                if paranoid::enabled() {
                    let derived = node.derive_hash();
                    // `paranoid::enabled()` is itself the gate (compile-time
                    // feature or runtime env var); once it's true this must
                    // assert in every build profile, so `assert_eq!` here,
                    // not `debug_assert_eq!`.
                    assert_eq!(
                        derived, expected,
                        "paranoid-hash mismatch for node {:?}",
                        id
                    );
                }
            }
            None => {
                node.recompute_hash();
            }
        }

        Ok(node)
    }

    /// Emits `self` in `format` into `out`. Encoding a scratch (`ERROR`)
    /// node, or an `INNER` node with no children, fails — the latter is a
    /// precondition the caller is expected to avoid, asserted in debug
    /// builds and returned as the same stable error in release.
    pub fn encode(&self, out: &mut Vec<u8>, format: OutputFormat) -> Result<(), NodeDecodeError> {
        let kind = match &self.state {
            NodeState::Ready(kind) => kind,
            NodeState::Scratch => {
                debug_assert!(false, "encode called on a scratch node");
                return Err(NodeDecodeError::InvalidNodeType);
            }
        };

        if format != OutputFormat::Hash {
            if let NodeKind::Inner { mask, .. } = kind {
                if *mask == 0 {
                    debug_assert!(false, "encode called on an empty inner node");
                    return Err(NodeDecodeError::InvalidNodeType);
                }
            }
        }

        match format {
            OutputFormat::Hash => codec::encode_hash(&self.hash, out),
            OutputFormat::Prefix => match kind {
                NodeKind::Inner { branches, .. } => codec::encode_prefix_inner(branches, out),
                NodeKind::Leaf { kind, item } => {
                    codec::encode_prefix_leaf(*kind, item.payload(), item.tag(), out)
                }
            },
            OutputFormat::Wire => match kind {
                NodeKind::Inner { branches, mask } => {
                    codec::encode_wire_inner(branches, mask.count_ones() as usize, out)
                }
                NodeKind::Leaf { kind, item } => {
                    codec::encode_wire_leaf(*kind, item.payload(), item.tag(), out)
                }
            },
        }

        Ok(())
    }

    /// Recomputes `hash` from the current fields. Returns whether it
    /// changed, so the enclosing trie can propagate dirtiness upward.
    pub fn recompute_hash(&mut self) -> bool {
        let new_hash = match &self.state {
            NodeState::Scratch => {
                debug_assert!(false, "recompute_hash called on a scratch node");
                ZERO_HASH
            }
            NodeState::Ready(_) => self.derive_hash(),
        };
        let changed = new_hash != self.hash;
        self.hash = new_hash;
        changed
    }

    fn derive_hash(&self) -> Hash256 {
        match &self.state {
            NodeState::Scratch => ZERO_HASH,
            NodeState::Ready(NodeKind::Inner { branches, mask }) => {
                if *mask == 0 {
                    ZERO_HASH
                } else {
                    let parts: Vec<&[u8]> = branches.iter().map(|b| b.as_slice()).collect();
                    hash::prefix_hash_parts(hash::INNER_NODE, &parts)
                }
            }
            NodeState::Ready(NodeKind::Leaf { kind, item }) => match kind {
                LeafKind::TxNoMeta => hash::prefix_hash(hash::TXN_ID, item.payload()),
                LeafKind::AccountState => {
                    hash::prefix_hash_parts(hash::LEAF_NODE, &[item.payload(), item.tag()])
                }
                LeafKind::TxMeta => {
                    hash::prefix_hash_parts(hash::TX_NODE, &[item.payload(), item.tag()])
                }
            },
        }
    }

    /// Replaces the stored item. Requires `self` already be a leaf of any
    /// kind; `leaf_type` may differ from the node's current kind.
    pub fn set_item(&mut self, item: Item, leaf_type: LeafKind) -> Result<bool, PreconditionError> {
        match &self.state {
            NodeState::Ready(NodeKind::Leaf { .. }) => {
                self.state = NodeState::Ready(NodeKind::Leaf {
                    kind: leaf_type,
                    item,
                });
                Ok(self.recompute_hash())
            }
            _ => {
                debug_assert!(false, "set_item called on a non-leaf node");
                Err(PreconditionError::NotALeaf)
            }
        }
    }

    /// A deep copy of the stored item. Requires `self` be a leaf.
    pub fn get_item(&self) -> Result<Item, PreconditionError> {
        match &self.state {
            NodeState::Ready(NodeKind::Leaf { item, .. }) => Ok(item.deep_copy()),
            _ => {
                debug_assert!(false, "get_item called on a non-leaf node");
                Err(PreconditionError::NotALeaf)
            }
        }
    }

    /// Sets `branches[slot]`, updates `branch_mask`, and recomputes the
    /// hash. Requires `self` be `INNER` and `slot` in `[0, 16)`.
    pub fn set_child_hash(
        &mut self,
        slot: u8,
        hash_value: Hash256,
    ) -> Result<bool, PreconditionError> {
        if slot >= 16 {
            debug_assert!(false, "set_child_hash slot {slot} out of range");
            return Err(PreconditionError::SlotOutOfRange(slot));
        }
        match &mut self.state {
            NodeState::Ready(NodeKind::Inner { branches, mask }) => {
                branches[slot as usize] = hash_value;
                if hash_value == ZERO_HASH {
                    *mask &= !(1u16 << slot);
                } else {
                    *mask |= 1u16 << slot;
                }
                Ok(self.recompute_hash())
            }
            _ => {
                debug_assert!(false, "set_child_hash called on a non-inner node");
                Err(PreconditionError::NotAnInner)
            }
        }
    }

    /// Resets `self` to an empty `INNER` node with no children.
    pub fn make_inner(&mut self) {
        self.state = NodeState::Ready(NodeKind::Inner {
            branches: [ZERO_HASH; 16],
            mask: 0,
        });
        self.hash = ZERO_HASH;
        self.full_below = false;
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.state, NodeState::Ready(NodeKind::Leaf { .. }))
    }

    pub fn is_inner(&self) -> bool {
        matches!(self.state, NodeState::Ready(NodeKind::Inner { .. }))
    }

    /// True for an `INNER` node with no children. Leaves and scratch nodes
    /// are never "empty" in this sense.
    pub fn is_empty(&self) -> bool {
        matches!(
            self.state,
            NodeState::Ready(NodeKind::Inner { mask: 0, .. })
        )
    }

    pub fn branch_count(&self) -> Result<u32, PreconditionError> {
        match &self.state {
            NodeState::Ready(NodeKind::Inner { mask, .. }) => Ok(mask.count_ones()),
            _ => Err(PreconditionError::NotAnInner),
        }
    }

    pub fn is_empty_branch(&self, slot: u8) -> Result<bool, PreconditionError> {
        if slot >= 16 {
            return Err(PreconditionError::SlotOutOfRange(slot));
        }
        match &self.state {
            NodeState::Ready(NodeKind::Inner { branches, .. }) => {
                Ok(branches[slot as usize] == ZERO_HASH)
            }
            _ => Err(PreconditionError::NotAnInner),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn seq(&self) -> u32 {
        self.seq
    }

    pub fn hash(&self) -> Hash256 {
        self.hash
    }

    pub fn full_below(&self) -> bool {
        self.full_below
    }

    pub fn set_full_below(&mut self, value: bool) {
        self.full_below = value;
    }

    /// Human-readable multi-line diagnostic dump: id, type, and either the
    /// non-empty branch slots or the item's tag/hash/payload length.
    /// Diagnostics only, not part of the wire protocol — supplements the
    /// reference implementation's `getString`/`dump` debug helpers.
    pub fn describe(&self) -> String {
        use std::fmt::Write as _;
        let mut out = String::new();
        let _ = writeln!(out, "node {:?} seq={}", self.id, self.seq);
        let _ = writeln!(out, "  hash: {}", hex::encode(self.hash));
        match &self.state {
            NodeState::Scratch => {
                let _ = writeln!(out, "  state: scratch (ERROR)");
            }
            NodeState::Ready(NodeKind::Inner { branches, mask }) => {
                let _ = writeln!(out, "  type: INNER branch_count={}", mask.count_ones());
                for (slot, branch) in branches.iter().enumerate() {
                    if *branch != ZERO_HASH {
                        let _ = writeln!(out, "    [{slot:>2}] {}", hex::encode(branch));
                    }
                }
            }
            NodeState::Ready(NodeKind::Leaf { kind, item }) => {
                let _ = writeln!(out, "  type: {kind:?}");
                let _ = writeln!(out, "  tag: {}", hex::encode(item.tag()));
                let _ = writeln!(out, "  payload_len: {}", item.payload().len());
            }
        }
        out
    }
}

impl NodeKind {
    fn clone_deep(&self) -> Self {
        match self {
            NodeKind::Inner { branches, mask } => NodeKind::Inner {
                branches: *branches,
                mask: *mask,
            },
            NodeKind::Leaf { kind, item } => NodeKind::Leaf {
                kind: *kind,
                item: item.deep_copy(),
            },
        }
    }
}

fn branch_mask(branches: &[Hash256; 16]) -> u16 {
    let mut mask = 0u16;
    for (slot, branch) in branches.iter().enumerate() {
        if *branch != ZERO_HASH {
            mask |= 1u16 << slot;
        }
    }
    mask
}

#[cfg(test)]
mod tests {
    use super::*;
    use codec::{InputFormat, OutputFormat};

    fn leaf_item(tag_byte: u8, payload: &[u8]) -> Item {
        Item::new([tag_byte; 32], payload.to_vec())
    }

    #[test]
    fn construct_leaf_rejects_short_payload() {
        let err = Node::construct_leaf(
            NodeId::new(1),
            leaf_item(1, b"short"),
            LeafKind::TxNoMeta,
            1,
        )
        .unwrap_err();
        assert_eq!(err, PreconditionError::PayloadTooShort);
    }

    #[test]
    fn construct_leaf_computes_hash() {
        let payload = b"abcdefghijkl".to_vec();
        let node =
            Node::construct_leaf(NodeId::new(1), leaf_item(1, &payload), LeafKind::TxNoMeta, 1)
                .unwrap();
        assert_eq!(node.hash(), hash::prefix_hash(hash::TXN_ID, &payload));
    }

    #[test]
    fn empty_inner_hashes_to_zero() {
        let mut node = Node::construct_empty(1, NodeId::new(1));
        node.make_inner();
        assert_eq!(node.hash(), ZERO_HASH);
        assert!(node.is_empty());
    }

    #[test]
    fn set_child_hash_updates_mask_and_hash() {
        let mut node = Node::construct_empty(1, NodeId::new(1));
        node.make_inner();
        let child_hash = [7u8; 32];
        let changed = node.set_child_hash(3, child_hash).unwrap();
        assert!(changed);
        assert_eq!(node.branch_count().unwrap(), 1);
        assert!(!node.is_empty_branch(3).unwrap());

        // Clearing it back to zero restores the empty-inner hash.
        let changed_again = node.set_child_hash(3, ZERO_HASH).unwrap();
        assert!(changed_again);
        assert_eq!(node.hash(), ZERO_HASH);
    }

    #[test]
    fn set_child_hash_same_value_is_a_no_op() {
        let mut node = Node::construct_empty(1, NodeId::new(1));
        node.make_inner();
        node.set_child_hash(0, [1u8; 32]).unwrap();
        let prior_hash = node.hash();
        let changed = node.set_child_hash(0, [1u8; 32]).unwrap();
        assert!(!changed);
        assert_eq!(node.hash(), prior_hash);
    }

    #[test]
    fn recompute_hash_is_idempotent() {
        let mut node = Node::construct_leaf(
            NodeId::new(1),
            leaf_item(1, b"abcdefghijkl"),
            LeafKind::TxNoMeta,
            1,
        )
        .unwrap();
        assert!(!node.recompute_hash());
    }

    #[test]
    fn clone_independence() {
        let node = Node::construct_leaf(
            NodeId::new(1),
            leaf_item(1, b"abcdefghijkl"),
            LeafKind::TxNoMeta,
            1,
        )
        .unwrap();
        let original_hash = node.hash();
        let mut clone = node.construct_clone(2).unwrap();
        clone
            .set_item(leaf_item(2, b"mnopqrstuvwx"), LeafKind::TxNoMeta)
            .unwrap();
        assert_eq!(node.hash(), original_hash);
        assert_ne!(clone.hash(), node.hash());
    }

    #[test]
    fn wire_roundtrip_tx_nometa() {
        let payload = b"abcdefghijkl".to_vec();
        let node = Node::construct_leaf(
            NodeId::new(9),
            leaf_item(1, &payload),
            LeafKind::TxNoMeta,
            1,
        )
        .unwrap();
        let mut buf = Vec::new();
        node.encode(&mut buf, OutputFormat::Wire).unwrap();
        assert_eq!(buf.last().copied(), Some(0));

        let decoded = Node::decode(NodeId::new(9), &buf, 1, InputFormat::Wire, None).unwrap();
        assert_eq!(decoded.hash(), node.hash());
        assert_eq!(decoded.get_item().unwrap().payload(), payload.as_slice());
    }

    #[test]
    fn prefix_roundtrip_tx_nometa() {
        let payload = b"abcdefghijkl".to_vec();
        let node = Node::construct_leaf(
            NodeId::new(9),
            leaf_item(1, &payload),
            LeafKind::TxNoMeta,
            1,
        )
        .unwrap();
        let mut buf = Vec::new();
        node.encode(&mut buf, OutputFormat::Prefix).unwrap();

        let decoded = Node::decode(NodeId::new(9), &buf, 1, InputFormat::Prefix, None).unwrap();
        assert_eq!(decoded.hash(), node.hash());
    }

    #[test]
    fn empty_leaf_tag_is_rejected() {
        let mut bytes = vec![0u8; 33];
        bytes[32] = 1; // WIRE tag for ACCOUNT_STATE
        let err = Node::decode(NodeId::new(0), &bytes, 1, InputFormat::Wire, None).unwrap_err();
        assert_eq!(err, NodeDecodeError::InvalidAccountState);
    }

    #[test]
    fn compressed_vs_full_boundary() {
        let mut node = Node::construct_empty(1, NodeId::new(1));
        node.make_inner();
        for slot in 0..11u8 {
            node.set_child_hash(slot, [slot + 1; 32]).unwrap();
        }
        let mut buf = Vec::new();
        node.encode(&mut buf, OutputFormat::Wire).unwrap();
        assert_eq!(buf.len(), 11 * 33 + 1);
        assert_eq!(buf.last().copied(), Some(3));

        node.set_child_hash(11, [12u8; 32]).unwrap();
        buf.clear();
        node.encode(&mut buf, OutputFormat::Wire).unwrap();
        assert_eq!(buf.len(), 16 * 32 + 1);
        assert_eq!(buf.last().copied(), Some(2));
    }

    #[test]
    fn unknown_prefix_is_rejected() {
        let mut bytes = vec![0xDE, 0xAD, 0xBE, 0xEF];
        bytes.extend_from_slice(&[0u8; 32]);
        let err =
            Node::decode(NodeId::new(0), &bytes, 1, InputFormat::Prefix, None).unwrap_err();
        assert_eq!(err, NodeDecodeError::InvalidPrefix);
    }

    #[test]
    fn prefix_full_inner_rejects_off_by_one_body_lengths() {
        for body_len in [511usize, 513] {
            let mut bytes = hash::INNER_NODE.to_be_bytes().to_vec();
            bytes.extend(std::iter::repeat(0u8).take(body_len));
            let err =
                Node::decode(NodeId::new(0), &bytes, 1, InputFormat::Prefix, None).unwrap_err();
            assert_eq!(err, NodeDecodeError::InvalidFullInnerPrefix);
        }
    }

    #[test]
    fn prefix_tx_node_accepts_zero_tag_but_wire_rejects_it() {
        let mut prefix_bytes = hash::TX_NODE.to_be_bytes().to_vec();
        prefix_bytes.extend_from_slice(b"abcdefghijkl");
        prefix_bytes.extend_from_slice(&ZERO_HASH);
        let decoded =
            Node::decode(NodeId::new(0), &prefix_bytes, 1, InputFormat::Prefix, None).unwrap();
        assert!(decoded.is_leaf());

        let mut wire_bytes = b"abcdefghijkl".to_vec();
        wire_bytes.extend_from_slice(&ZERO_HASH);
        wire_bytes.push(4);
        let err = Node::decode(NodeId::new(0), &wire_bytes, 1, InputFormat::Wire, None)
            .unwrap_err();
        assert_eq!(err, NodeDecodeError::InvalidTxMeta);
    }

    #[test]
    fn encoding_scratch_node_fails() {
        let node = Node::construct_empty(1, NodeId::new(1));
        let mut buf = Vec::new();
        let err = node.encode(&mut buf, OutputFormat::Hash).unwrap_err();
        assert_eq!(err, NodeDecodeError::InvalidNodeType);
    }

    #[test]
    fn encoding_empty_inner_fails() {
        let mut node = Node::construct_empty(1, NodeId::new(1));
        node.make_inner();
        let mut buf = Vec::new();
        let err = node.encode(&mut buf, OutputFormat::Wire).unwrap_err();
        assert_eq!(err, NodeDecodeError::InvalidNodeType);
    }
}
