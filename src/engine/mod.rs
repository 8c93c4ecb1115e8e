//! Storage engine
//!
//! Validation and error classification for the four domain operations on
//! top of the entry store. The engine owns no mutable state of its own; any
//! number of engines may share one store.

pub mod context;

pub use context::{CancelToken, RequestContext};

use crate::common::{timestamp_now_millis, validate_key, Error, Result};
use crate::store::EntryStore;
use bytes::Bytes;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Liveness token returned by a heartbeat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alive {
    pub node_id: String,
    /// Unix time in milliseconds
    pub timestamp_ms: i64,
    pub uptime: Duration,
}

/// The operation set served over RPC.
///
/// Operations are synchronous: they never do I/O and block at most on a
/// shard lock.
pub trait Storage: Send + Sync + 'static {
    /// Always succeeds, has no side effects.
    fn heartbeat(&self) -> Alive;

    fn get(&self, ctx: &RequestContext, key: &[u8]) -> Result<Bytes>;

    /// Upsert; last writer wins.
    fn set(&self, ctx: &RequestContext, key: Bytes, value: Bytes) -> Result<()>;

    /// Fails with `NotFound` when the key was absent.
    fn delete(&self, ctx: &RequestContext, key: &[u8]) -> Result<()>;
}

pub struct StorageEngine {
    store: Arc<dyn EntryStore>,
    node_id: String,
    started: Instant,
}

impl StorageEngine {
    pub fn new(store: Arc<dyn EntryStore>, node_id: impl Into<String>) -> Self {
        Self {
            store,
            node_id: node_id.into(),
            started: Instant::now(),
        }
    }

    pub fn store(&self) -> &dyn EntryStore {
        self.store.as_ref()
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }
}

impl Storage for StorageEngine {
    fn heartbeat(&self) -> Alive {
        Alive {
            node_id: self.node_id.clone(),
            timestamp_ms: timestamp_now_millis(),
            uptime: self.started.elapsed(),
        }
    }

    fn get(&self, ctx: &RequestContext, key: &[u8]) -> Result<Bytes> {
        ctx.check()?;
        validate_key(key)?;
        self.store.read(key).ok_or(Error::NotFound)
    }

    fn set(&self, ctx: &RequestContext, key: Bytes, value: Bytes) -> Result<()> {
        ctx.check()?;
        validate_key(&key)?;
        tracing::trace!(key_len = key.len(), value_len = value.len(), "set");
        self.store.write(key, value);
        Ok(())
    }

    fn delete(&self, ctx: &RequestContext, key: &[u8]) -> Result<()> {
        ctx.check()?;
        validate_key(key)?;
        if self.store.remove(key) {
            tracing::trace!(key_len = key.len(), "delete");
            Ok(())
        } else {
            Err(Error::NotFound)
        }
    }
}
