//! Entry store
//!
//! Thread-safe key → value storage. A store is a raw data structure: it
//! never fails and does not validate keys; validation belongs to the
//! storage engine in front of it.
//!
//! Two backends implement [`EntryStore`]:
//! - [`ShardedStore`]: `DashMap`, hash-sharded, the default
//! - [`SkipListStore`]: shards of ordered [`SkipList`]s

pub mod sharded;
pub mod skiplist;
pub mod skiplist_store;

pub use sharded::ShardedStore;
pub use skiplist::SkipList;
pub use skiplist_store::SkipListStore;

use bytes::Bytes;

/// Operations every entry store provides.
///
/// Operations on one key are linearizable. Operations on keys held by
/// different shards never wait on each other.
pub trait EntryStore: Send + Sync + 'static {
    /// Get the value stored under `key`, if any
    fn read(&self, key: &[u8]) -> Option<Bytes>;

    /// Insert or overwrite `key`
    fn write(&self, key: Bytes, value: Bytes);

    /// Delete `key`, returning whether it was present
    fn remove(&self, key: &[u8]) -> bool;

    /// Number of entries. Not a consistent snapshot under concurrent writes.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
