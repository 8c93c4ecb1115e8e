//! Server binary

use anyhow::Result;
use clap::Parser;
use shardkv::{Config, Node, StoreBackend};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "shardkv-server")]
#[command(about = "shardkv server - sharded in-memory KV store over gRPC")]
#[command(version)]
struct Args {
    /// TOML config file (values can also come from SHARDKV_* variables)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Node ID reported by heartbeats
    #[arg(long)]
    id: Option<String>,

    /// gRPC address to listen on
    #[arg(short, long)]
    addr: Option<SocketAddr>,

    /// Entry store implementation
    #[arg(long, value_enum)]
    backend: Option<StoreBackend>,

    /// Number of store shards
    #[arg(long)]
    shards: Option<usize>,

    /// Default request deadline (e.g. "5s", "250ms")
    #[arg(long)]
    request_timeout: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // CLI flags take priority over file and environment
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(id) = args.id {
        config.node_id = id;
    }
    if let Some(addr) = args.addr {
        config.grpc_addr = addr;
    }
    if let Some(backend) = args.backend {
        config.store_backend = backend;
    }
    if let Some(shards) = args.shards {
        config.num_shards = shards;
    }
    if let Some(timeout) = args.request_timeout {
        config.request_timeout = timeout;
    }
    if let Some(level) = args.log_level {
        config.log_level = level;
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting shardkv {}", shardkv::VERSION);

    let node = Node::new(config)?;
    node.serve().await?;

    Ok(())
}
