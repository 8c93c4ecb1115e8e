//! # shardkv
//!
//! A single-node, in-memory key-value store served over gRPC:
//! - Sharded entry store with per-key linearizable operations, backed by
//!   `DashMap` or by per-shard skip lists
//! - Storage engine with key validation and request deadlines
//! - gRPC handler that turns engine faults into structured statuses
//!
//! ## Architecture
//!
//! ```text
//!   gRPC client
//!        │  Heartbeat / Get / Set / Delete
//! ┌──────▼──────────────┐
//! │ StorageService      │  status mapping, panic containment
//! └──────┬──────────────┘
//! ┌──────▼──────────────┐
//! │ StorageEngine       │  validation, deadlines, NotFound
//! └──────┬──────────────┘
//! ┌──────▼──────────────┐
//! │ EntryStore          │  ShardedStore (DashMap)
//! │                     │  SkipListStore (N × RwLock<SkipList>)
//! └─────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ### Start a server
//! ```bash
//! shardkv-server --addr 127.0.0.1:50051 --shards 64
//! shardkv-server --backend skiplist
//! ```
//!
//! ### Use the CLI
//! ```bash
//! shardkv set user:1 alice
//! shardkv get user:1
//! shardkv delete user:1
//! shardkv heartbeat
//! ```

pub mod common;
pub mod engine;
pub mod rpc;
pub mod server;
pub mod store;

// Re-export commonly used types
pub use common::{Config, Error, Result, StoreBackend};
pub use engine::{RequestContext, Storage, StorageEngine};
pub use rpc::{KvClient, ServerAdaptor, StorageService};
pub use server::Node;
pub use store::{EntryStore, ShardedStore, SkipList, SkipListStore};

// Generated protobuf code
pub mod proto {
    tonic::include_proto!("shardkv");
}

/// Current version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
