//! Hashing utilities for shardkv
//!
//! BLAKE3 is used to spread keys across the skip-list store's shards.

/// Compute the shard index for a key.
///
/// Deterministic for a given `num_shards`; `num_shards` must be non-zero.
pub fn shard_index(key: &[u8], num_shards: usize) -> usize {
    debug_assert!(num_shards > 0);
    let hash = blake3::hash(key);
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&hash.as_bytes()[..8]);
    (u64::from_le_bytes(prefix) % num_shards as u64) as usize
}
