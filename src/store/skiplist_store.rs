//! Skip-list entry store
//!
//! A fixed number of shards, each a [`SkipList`] behind a
//! `parking_lot::RwLock`. A key's shard is chosen by hashing it, so
//! operations on one key are serialized by that shard's lock and keys on
//! other shards proceed in parallel. Keys are ordered within a shard.

use crate::common::shard_index;
use crate::store::skiplist::{SkipList, DEFAULT_MAX_LEVEL};
use crate::store::EntryStore;
use bytes::Bytes;
use parking_lot::RwLock;

/// Shard count used by [`SkipListStore::new`]
pub const DEFAULT_SHARDS: usize = 64;

#[derive(Debug)]
pub struct SkipListStore {
    shards: Box<[RwLock<SkipList>]>,
}

impl SkipListStore {
    pub fn new() -> Self {
        Self::with_shards(DEFAULT_SHARDS, DEFAULT_MAX_LEVEL)
    }

    /// A shard count of zero is treated as one; `max_level` is clamped as
    /// in [`SkipList::with_max_level`].
    pub fn with_shards(num_shards: usize, max_level: usize) -> Self {
        let shards = (0..num_shards.max(1))
            .map(|_| RwLock::new(SkipList::with_max_level(max_level)))
            .collect();
        Self { shards }
    }

    pub fn num_shards(&self) -> usize {
        self.shards.len()
    }

    pub fn max_level(&self) -> usize {
        self.shards[0].read().max_level()
    }

    fn shard(&self, key: &[u8]) -> &RwLock<SkipList> {
        &self.shards[shard_index(key, self.shards.len())]
    }
}

impl EntryStore for SkipListStore {
    fn read(&self, key: &[u8]) -> Option<Bytes> {
        self.shard(key).read().get(key).cloned()
    }

    fn write(&self, key: Bytes, value: Bytes) {
        self.shard(&key).write().insert(key, value);
    }

    fn remove(&self, key: &[u8]) -> bool {
        self.shard(key).write().remove(key).is_some()
    }

    fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.read().len()).sum()
    }

    fn is_empty(&self) -> bool {
        self.shards.iter().all(|shard| shard.read().is_empty())
    }
}

impl Default for SkipListStore {
    fn default() -> Self {
        Self::new()
    }
}
