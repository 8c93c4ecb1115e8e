//! Common utilities and types shared across shardkv

pub mod config;
pub mod error;
pub mod hash;
pub mod metrics;
pub mod utils;

pub use self::config::{Config, StoreBackend};
pub use error::{Error, Result};
pub use hash::shard_index;
pub use metrics::{MetricsRegistry, Op, OpSummary};
pub use utils::{parse_duration, timestamp_now_millis, validate_key};
