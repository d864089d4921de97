//! Byte-level WIRE and PREFIX decoders/encoders. Pure functions over
//! `&[u8]` / `Vec<u8>` with no intermediate buffer abstraction, the way
//! `ethrex-trie`'s `codec.rs` builds and parses its own wire form directly.

use crate::error::NodeDecodeError;
use crate::hash::{self, Hash256, INNER_NODE, LEAF_NODE, TXN_ID, TX_NODE, ZERO_HASH};
use crate::LeafKind;

/// Which of the two recognized input formats a byte blob is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Wire,
    Prefix,
}

/// Which of the three output formats to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Hash,
    Prefix,
    Wire,
}

const WIRE_TAG_TX_NOMETA: u8 = 0;
const WIRE_TAG_ACCOUNT_STATE: u8 = 1;
const WIRE_TAG_INNER_FULL: u8 = 2;
const WIRE_TAG_INNER_COMPRESSED: u8 = 3;
const WIRE_TAG_TX_META: u8 = 4;

const INNER_FULL_BODY_LEN: usize = 512;
const COMPRESSED_GROUP_LEN: usize = 33;

/// The structural result of decoding, before the node assembles a cached
/// hash from it. Doesn't carry `branch_mask` — the caller derives it from
/// `branches` in one pass, same as every other mutator does.
pub enum DecodedBody {
    Inner { branches: [Hash256; 16] },
    Leaf { kind: LeafKind, tag: Hash256, payload: Vec<u8> },
}

pub fn decode(format: InputFormat, bytes: &[u8]) -> Result<DecodedBody, NodeDecodeError> {
    match format {
        InputFormat::Wire => decode_wire(bytes),
        InputFormat::Prefix => decode_prefix(bytes),
    }
}

fn decode_wire(bytes: &[u8]) -> Result<DecodedBody, NodeDecodeError> {
    let (body, tag) = bytes
        .split_last()
        .ok_or(NodeDecodeError::InvalidWireType)?;
    match *tag {
        WIRE_TAG_TX_NOMETA => {
            let payload = body.to_vec();
            let item_tag = hash::prefix_hash(TXN_ID, &payload);
            Ok(DecodedBody::Leaf {
                kind: LeafKind::TxNoMeta,
                tag: item_tag,
                payload,
            })
        }
        WIRE_TAG_ACCOUNT_STATE => decode_leaf_tail_tagged(
            body,
            LeafKind::AccountState,
            NodeDecodeError::ShortAccountState,
            NodeDecodeError::InvalidAccountState,
        ),
        WIRE_TAG_INNER_FULL => decode_inner_full(body, NodeDecodeError::InvalidFullInnerWire),
        WIRE_TAG_INNER_COMPRESSED => decode_inner_compressed(body),
        WIRE_TAG_TX_META => decode_leaf_tail_tagged(
            body,
            LeafKind::TxMeta,
            NodeDecodeError::ShortTxMeta,
            NodeDecodeError::InvalidTxMeta,
        ),
        _ => Err(NodeDecodeError::InvalidWireType),
    }
}

/// Shared shape of `ACCOUNT_STATE` and `TX_META` under WIRE: last 32 bytes
/// of `body` are the tag, rejected if zero; the rest is payload. The
/// length check always precedes the zero-tag check.
fn decode_leaf_tail_tagged(
    body: &[u8],
    kind: LeafKind,
    short_err: NodeDecodeError,
    invalid_err: NodeDecodeError,
) -> Result<DecodedBody, NodeDecodeError> {
    if body.len() < 32 {
        return Err(short_err);
    }
    let split = body.len() - 32;
    let tag: Hash256 = body[split..].try_into().expect("exactly 32 bytes");
    if tag == ZERO_HASH {
        return Err(invalid_err);
    }
    Ok(DecodedBody::Leaf {
        kind,
        tag,
        payload: body[..split].to_vec(),
    })
}

/// Full 16-hash inner body, shared by WIRE *t*=2 and PREFIX `INNER_NODE`.
/// The reference keeps two distinct error strings for the two call sites
/// (`"invalid FI node"` vs `"invalid PIN node"`), so the caller supplies
/// which one applies here.
fn decode_inner_full(
    body: &[u8],
    length_err: NodeDecodeError,
) -> Result<DecodedBody, NodeDecodeError> {
    if body.len() != INNER_FULL_BODY_LEN {
        return Err(length_err);
    }
    let mut branches = [ZERO_HASH; 16];
    for (slot, chunk) in body.chunks_exact(32).enumerate() {
        branches[slot] = chunk.try_into().expect("32-byte chunk");
    }
    Ok(DecodedBody::Inner { branches })
}

fn decode_inner_compressed(body: &[u8]) -> Result<DecodedBody, NodeDecodeError> {
    if body.len() % COMPRESSED_GROUP_LEN != 0 {
        return Err(NodeDecodeError::InvalidCompressedInner);
    }
    let mut branches = [ZERO_HASH; 16];
    for group in body.chunks_exact(COMPRESSED_GROUP_LEN) {
        let (hash_bytes, slot_byte) = group.split_at(32);
        let slot = slot_byte[0] as usize;
        if slot >= 16 {
            return Err(NodeDecodeError::InvalidCompressedInner);
        }
        branches[slot] = hash_bytes.try_into().expect("32-byte chunk");
    }
    Ok(DecodedBody::Inner { branches })
}

fn decode_prefix(bytes: &[u8]) -> Result<DecodedBody, NodeDecodeError> {
    if bytes.len() < 4 {
        return Err(NodeDecodeError::InvalidPrefixBody);
    }
    let (prefix_bytes, body) = bytes.split_at(4);
    let prefix = u32::from_be_bytes(prefix_bytes.try_into().expect("4 bytes"));
    match prefix {
        TXN_ID => {
            let item_tag = hash::sha512_half(bytes);
            Ok(DecodedBody::Leaf {
                kind: LeafKind::TxNoMeta,
                tag: item_tag,
                payload: body.to_vec(),
            })
        }
        LEAF_NODE => decode_leaf_tail_tagged_unconditionally(
            body,
            LeafKind::AccountState,
            NodeDecodeError::ShortPrefixLeaf,
            Some(NodeDecodeError::InvalidPrefixLeaf),
        ),
        INNER_NODE => decode_inner_full(body, NodeDecodeError::InvalidFullInnerPrefix),
        TX_NODE => decode_leaf_tail_tagged_unconditionally(
            body,
            LeafKind::TxMeta,
            NodeDecodeError::ShortPrefixTxMeta,
            None,
        ),
        _ => Err(NodeDecodeError::InvalidPrefix),
    }
}

/// Like [`decode_leaf_tail_tagged`], but the zero-tag rejection is
/// optional: `TX_NODE` under PREFIX accepts a zero transaction id, the
/// asymmetry preserved from the reference implementation.
fn decode_leaf_tail_tagged_unconditionally(
    body: &[u8],
    kind: LeafKind,
    short_err: NodeDecodeError,
    invalid_err: Option<NodeDecodeError>,
) -> Result<DecodedBody, NodeDecodeError> {
    if body.len() < 32 {
        return Err(short_err);
    }
    let split = body.len() - 32;
    let tag: Hash256 = body[split..].try_into().expect("exactly 32 bytes");
    if tag == ZERO_HASH {
        if let Some(err) = invalid_err {
            return Err(err);
        }
    }
    Ok(DecodedBody::Leaf {
        kind,
        tag,
        payload: body[..split].to_vec(),
    })
}

pub fn encode_hash(hash: &Hash256, out: &mut Vec<u8>) {
    out.extend_from_slice(hash);
}

pub fn encode_prefix_inner(branches: &[Hash256; 16], out: &mut Vec<u8>) {
    out.extend_from_slice(&INNER_NODE.to_be_bytes());
    for branch in branches {
        out.extend_from_slice(branch);
    }
}

pub fn encode_prefix_leaf(kind: LeafKind, payload: &[u8], tag: &Hash256, out: &mut Vec<u8>) {
    let prefix = match kind {
        LeafKind::TxNoMeta => TXN_ID,
        LeafKind::AccountState => LEAF_NODE,
        LeafKind::TxMeta => TX_NODE,
    };
    out.extend_from_slice(&prefix.to_be_bytes());
    out.extend_from_slice(payload);
    if kind != LeafKind::TxNoMeta {
        out.extend_from_slice(tag);
    }
}

pub fn encode_wire_inner(branches: &[Hash256; 16], branch_count: usize, out: &mut Vec<u8>) {
    if branch_count < 12 {
        for (slot, branch) in branches.iter().enumerate() {
            if *branch != ZERO_HASH {
                out.extend_from_slice(branch);
                out.push(slot as u8);
            }
        }
        out.push(WIRE_TAG_INNER_COMPRESSED);
    } else {
        for branch in branches {
            out.extend_from_slice(branch);
        }
        out.push(WIRE_TAG_INNER_FULL);
    }
}

pub fn encode_wire_leaf(kind: LeafKind, payload: &[u8], tag: &Hash256, out: &mut Vec<u8>) {
    out.extend_from_slice(payload);
    let wire_tag = match kind {
        LeafKind::TxNoMeta => {
            out.push(WIRE_TAG_TX_NOMETA);
            return;
        }
        LeafKind::AccountState => WIRE_TAG_ACCOUNT_STATE,
        LeafKind::TxMeta => WIRE_TAG_TX_META,
    };
    out.extend_from_slice(tag);
    out.push(wire_tag);
}
