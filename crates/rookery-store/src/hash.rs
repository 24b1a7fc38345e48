//! Content hashing for duplicate detection and exact-triple lookup.

use std::hash::BuildHasher;

/// 64-bit content hash of a triple.
///
/// Fixed seeds so the same triple hashes identically across store instances
/// and process runs. Not cryptographic: duplicate rejection is exact only up
/// to 64-bit collisions, which is acceptable for a non-adversarial store.
pub(crate) fn triple_hash(source: &str, relation: &str, target: &str) -> u64 {
    const K0: u64 = 0x6b6f_6f72_6572_790a;
    const K1: u64 = 0x7472_6970_6c65_730a;
    const K2: u64 = 0x736f_7572_6365_730a;
    const K3: u64 = 0x7461_7267_6574_730a;

    ahash::RandomState::with_seeds(K0, K1, K2, K3).hash_one((source, relation, target))
}
