//! Configuration for shardkv

use crate::common::utils::parse_duration;
use crate::common::{Error, Result};
use crate::store::skiplist::MAX_LEVEL_LIMIT;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Environment variable prefix, e.g. `SHARDKV_GRPC_ADDR`.
pub const ENV_PREFIX: &str = "SHARDKV";

/// Entry store implementation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Hash-sharded `DashMap`
    #[default]
    Sharded,
    /// Hash-sharded skip lists, ordered within each shard
    Skiplist,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Node ID, reported by heartbeats
    #[serde(default = "default_node_id")]
    pub node_id: String,

    /// Bind address for the gRPC listener
    #[serde(default = "default_grpc_addr")]
    pub grpc_addr: SocketAddr,

    /// Entry store implementation
    #[serde(default)]
    pub store_backend: StoreBackend,

    /// Number of entry store shards
    #[serde(default = "default_num_shards")]
    pub num_shards: usize,

    /// Height cap of each skip list (skiplist backend only)
    #[serde(default = "default_skiplist_max_level")]
    pub skiplist_max_level: usize,

    /// Deadline applied to requests that carry none (e.g. "5s", "250ms")
    #[serde(default = "default_request_timeout")]
    pub request_timeout: String,

    /// Maximum in-flight requests per client connection
    #[serde(default = "default_concurrency_limit")]
    pub concurrency_limit_per_connection: usize,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_node_id() -> String {
    "node-1".to_string()
}
fn default_grpc_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 50051))
}
fn default_num_shards() -> usize {
    64
}
fn default_skiplist_max_level() -> usize {
    12
}
fn default_request_timeout() -> String {
    "5s".to_string()
}
fn default_concurrency_limit() -> usize {
    256
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            node_id: default_node_id(),
            grpc_addr: default_grpc_addr(),
            store_backend: StoreBackend::default(),
            num_shards: default_num_shards(),
            skiplist_max_level: default_skiplist_max_level(),
            request_timeout: default_request_timeout(),
            concurrency_limit_per_connection: default_concurrency_limit(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration: defaults, then the optional TOML file, then
    /// `SHARDKV_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path).required(true));
        }
        let config: Config = builder
            .add_source(::config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.node_id.trim().is_empty() {
            return Err(Error::InvalidConfig("node_id must not be empty".into()));
        }
        if self.num_shards == 0 {
            return Err(Error::InvalidConfig("num_shards must be at least 1".into()));
        }
        if !(1..=MAX_LEVEL_LIMIT).contains(&self.skiplist_max_level) {
            return Err(Error::InvalidConfig(format!(
                "skiplist_max_level must be between 1 and {}",
                MAX_LEVEL_LIMIT
            )));
        }
        if self.concurrency_limit_per_connection == 0 {
            return Err(Error::InvalidConfig(
                "concurrency_limit_per_connection must be at least 1".into(),
            ));
        }
        if self.request_timeout()?.is_zero() {
            return Err(Error::InvalidConfig("request_timeout must be positive".into()));
        }
        Ok(())
    }

    /// Parsed `request_timeout`
    pub fn request_timeout(&self) -> Result<Duration> {
        parse_duration(&self.request_timeout)
    }
}
