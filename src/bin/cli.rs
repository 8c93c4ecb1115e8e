//! CLI for a shardkv server

use clap::{Parser, Subcommand};
use shardkv::{Error, KvClient};
use std::io::Write;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "shardkv")]
#[command(about = "shardkv key-value store CLI")]
#[command(version)]
struct Cli {
    /// Server URL
    #[arg(long, default_value = "http://127.0.0.1:50051")]
    endpoint: String,

    /// Per-request deadline in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the server is alive
    Heartbeat,

    /// Print the value stored under a key
    Get {
        /// Key
        key: String,
    },

    /// Store a value under a key
    Set {
        /// Key
        key: String,

        /// Value
        value: String,
    },

    /// Delete a key
    Delete {
        /// Key
        key: String,

        /// Succeed even if the key does not exist
        #[arg(long)]
        if_exists: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();

    let mut client = KvClient::connect(cli.endpoint.clone()).await?;
    if let Some(ms) = cli.timeout_ms {
        client = client.with_timeout(Duration::from_millis(ms));
    }

    match cli.command {
        Commands::Heartbeat => {
            let pong = client.heartbeat().await?;
            println!("Node {} is alive", pong.node_id);
            println!("  Timestamp: {} ms", pong.timestamp_ms);
            println!("  Uptime: {:?}", Duration::from_millis(pong.uptime_ms));
        }

        Commands::Get { key } => {
            let value = client.get(key).await?;
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&value)?;
            stdout.write_all(b"\n")?;
        }

        Commands::Set { key, value } => {
            client.set(key, value).await?;
            println!("OK");
        }

        Commands::Delete { key, if_exists } => match client.delete(key).await {
            Ok(()) => println!("OK"),
            Err(Error::NotFound) if if_exists => println!("OK (absent)"),
            Err(e) => return Err(e.into()),
        },
    }

    Ok(())
}
