//! Truncated-512 hashing and the four domain-separation prefixes that key it.

use sha2::Digest as _;

/// A 256-bit content hash. All-zero is the sentinel for "no hash" (an
/// `INNER` node with no children, or the scratch state before a decoder
/// has filled a node in).
pub type Hash256 = [u8; 32];

pub const ZERO_HASH: Hash256 = [0u8; 32];

/// Domain-separation prefix for a `TX_NOMETA` leaf, prepended to the raw
/// transaction bytes before hashing ("TXN\0").
pub const TXN_ID: u32 = 0x5458_4E00;

/// Domain-separation prefix for an `ACCOUNT_STATE` leaf ("MLN\0").
pub const LEAF_NODE: u32 = 0x4D4C_4E00;

/// Domain-separation prefix for a `TX_META` leaf ("SND\0").
pub const TX_NODE: u32 = 0x534E_4400;

/// Domain-separation prefix for an `INNER` node ("MIN\0").
pub const INNER_NODE: u32 = 0x4D49_4E00;

/// SHA-512, truncated to the first 32 bytes (256 bits) of the 64-byte
/// digest. Used directly, with no prefix, by the `PREFIX`-format
/// `TX_NOMETA` decode path (`hash_full`), which hashes the prefix bytes
/// that are already part of the input.
pub fn sha512_half(bytes: &[u8]) -> Hash256 {
    let digest = sha2::Sha512::digest(bytes);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest[..32]);
    out
}

/// Truncated-512 hash of a 4-byte big-endian domain prefix concatenated
/// with `bytes`. This is `HP(p, bytes)` in the node's hashing scheme.
pub fn prefix_hash(prefix: u32, bytes: &[u8]) -> Hash256 {
    let mut hasher = sha2::Sha512::new();
    hasher.update(prefix.to_be_bytes());
    hasher.update(bytes);
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest[..32]);
    out
}

/// Truncated-512 hash of several byte slices concatenated in order, under
/// a single domain prefix. Used by the leaf hashing schemes, which hash
/// `prefix || payload || tag` without materializing the concatenation.
pub fn prefix_hash_parts(prefix: u32, parts: &[&[u8]]) -> Hash256 {
    let mut hasher = sha2::Sha512::new();
    hasher.update(prefix.to_be_bytes());
    for part in parts {
        hasher.update(part);
    }
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest[..32]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_hash_is_deterministic() {
        let a = prefix_hash(TXN_ID, b"hello");
        let b = prefix_hash(TXN_ID, b"hello");
        assert_eq!(a, b);
    }

    #[test]
    fn different_prefixes_diverge() {
        let a = prefix_hash(TXN_ID, b"hello");
        let b = prefix_hash(LEAF_NODE, b"hello");
        assert_ne!(a, b);
    }

    #[test]
    fn prefix_hash_parts_matches_manual_concat() {
        let payload = b"payload-bytes";
        let tag = [7u8; 32];
        let expected = {
            let mut buf = Vec::new();
            buf.extend_from_slice(payload);
            buf.extend_from_slice(&tag);
            prefix_hash(LEAF_NODE, &buf)
        };
        let actual = prefix_hash_parts(LEAF_NODE, &[payload, &tag]);
        assert_eq!(expected, actual);
    }

    #[test]
    fn sha512_half_is_32_bytes_of_the_64_byte_digest() {
        let full = sha2::Sha512::digest(b"abc");
        let half = sha512_half(b"abc");
        assert_eq!(&full[..32], &half[..]);
    }
}
