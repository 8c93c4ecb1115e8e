//! Node bootstrap
//!
//! Builds the stack explicitly (store → engine → handler → adaptor) and
//! serves it. Nothing here is global, so several nodes can live in one
//! process.

use crate::common::{Config, Result, StoreBackend};
use crate::engine::StorageEngine;
use crate::rpc::{ServerAdaptor, ServerOptions, StorageService};
use crate::store::{EntryStore, ShardedStore, SkipListStore};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

pub struct Node {
    config: Config,
    adaptor: ServerAdaptor<StorageEngine>,
}

impl Node {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let request_timeout = config.request_timeout()?;

        let store: Arc<dyn EntryStore> = match config.store_backend {
            StoreBackend::Sharded => Arc::new(ShardedStore::with_shards(config.num_shards)),
            StoreBackend::Skiplist => Arc::new(SkipListStore::with_shards(
                config.num_shards,
                config.skiplist_max_level,
            )),
        };
        let engine = Arc::new(StorageEngine::new(store, config.node_id.clone()));
        let service = StorageService::new(engine).with_default_timeout(request_timeout);
        let adaptor = ServerAdaptor::with_options(
            service,
            ServerOptions {
                timeout: Some(request_timeout),
                concurrency_limit_per_connection: Some(config.concurrency_limit_per_connection),
            },
        );

        Ok(Self { config, adaptor })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn service(&self) -> &StorageService<StorageEngine> {
        self.adaptor.service()
    }

    /// Bind the configured address and serve until Ctrl-C.
    pub async fn serve(self) -> Result<()> {
        let listener = TcpListener::bind(self.config.grpc_addr).await?;
        self.serve_with_listener(listener, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutdown signal received");
        })
        .await
    }

    /// Serve on a caller-owned listener until `shutdown` resolves.
    pub async fn serve_with_listener<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tracing::info!("Starting node: {}", self.config.node_id);
        tracing::info!("  gRPC API: {}", listener.local_addr()?);
        tracing::info!(
            "  Store: {:?}, {} shards",
            self.config.store_backend,
            self.config.num_shards
        );
        tracing::info!("  Request timeout: {}", self.config.request_timeout);

        let service = self.adaptor.service().clone();
        let result = self.adaptor.run_until(listener, shutdown).await;

        let metrics = service.metrics();
        tracing::info!(
            "Served {} requests in {:?}",
            metrics.total_requests(),
            metrics.uptime()
        );
        for op in metrics.summary() {
            tracing::info!(
                op = %op.op,
                requests = op.requests,
                errors = op.errors,
                mean_latency_us = op.mean_latency.as_micros() as u64,
                p99_latency_us = op.p99_latency.map(|d| d.as_micros() as u64),
                "request summary"
            );
        }

        if let Err(e) = &result {
            tracing::error!("gRPC server error: {}", e);
        }
        result
    }
}
