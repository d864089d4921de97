//! Paranoid-hash checking: re-derive a decoded node's hash and assert it
//! matches the caller-supplied `expected_hash` instead of trusting it
//! blindly. Gated behind the `paranoid-hash` Cargo feature at compile time,
//! and additionally overridable at runtime via `SHAMAP_PARANOID_HASH`
//! (checked once and cached, the way the teacher caches `EMPTY_TRIE_HASH`
//! behind `lazy_static!`).

use lazy_static::lazy_static;

lazy_static! {
    static ref RUNTIME_OVERRIDE: Option<bool> = std::env::var("SHAMAP_PARANOID_HASH")
        .ok()
        .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "yes"));
}

/// Whether decode should re-derive and assert the hash of an adopted
/// `expected_hash` rather than trusting it outright. The environment
/// variable, when set, overrides the compile-time feature in either
/// direction; when unset, the `paranoid-hash` feature decides.
pub fn enabled() -> bool {
    if let Some(forced) = *RUNTIME_OVERRIDE {
        return forced;
    }
    cfg!(feature = "paranoid-hash")
}
