//! Sharded entry store
//!
//! A `DashMap<Bytes, Bytes>`: the keyspace is split across a fixed number
//! of internally locked shards. A key always maps to the same shard, so
//! every operation on a key is serialized by that shard's lock while keys
//! on other shards proceed in parallel.
//!
//! # Thread Safety
//!
//! - `read()`: shared lock on the key's shard only
//! - `write()` / `remove()`: exclusive lock on the key's shard only
//! - `len()`: visits every shard in turn

use crate::store::EntryStore;
use bytes::Bytes;
use dashmap::DashMap;

/// Shard count used by [`ShardedStore::new`]
pub const DEFAULT_SHARDS: usize = 64;

#[derive(Debug)]
pub struct ShardedStore {
    map: DashMap<Bytes, Bytes>,
    num_shards: usize,
}

impl ShardedStore {
    /// Create an empty store with [`DEFAULT_SHARDS`] shards
    pub fn new() -> Self {
        Self::with_shards(DEFAULT_SHARDS)
    }

    /// Create an empty store.
    ///
    /// `DashMap` needs a power of two greater than one, so `num_shards` is
    /// rounded up to the next one (minimum 2).
    pub fn with_shards(num_shards: usize) -> Self {
        let num_shards = num_shards.max(2).next_power_of_two();
        Self {
            map: DashMap::with_shard_amount(num_shards),
            num_shards,
        }
    }

    pub fn num_shards(&self) -> usize {
        self.num_shards
    }
}

impl EntryStore for ShardedStore {
    fn read(&self, key: &[u8]) -> Option<Bytes> {
        self.map.get(key).map(|entry| entry.value().clone())
    }

    fn write(&self, key: Bytes, value: Bytes) {
        self.map.insert(key, value);
    }

    fn remove(&self, key: &[u8]) -> bool {
        self.map.remove(key).is_some()
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl Default for ShardedStore {
    fn default() -> Self {
        Self::new()
    }
}
