//! gRPC service handler
//!
//! Adapts the storage engine to the generated `Storage` service: builds a
//! request context from metadata, runs the engine operation, and maps the
//! outcome onto a response or a status. A panic inside the engine is caught
//! here and answered with `INTERNAL`; it never reaches the transport.

use crate::common::{Error, MetricsRegistry, Op, Result};
use crate::engine::{CancelToken, RequestContext, Storage};
use crate::proto::storage_server::{Storage as StorageRpc, StorageServer};
use crate::proto::{Ack, DeleteRequest, GetRequest, GetResponse, Ping, Pong, SetRequest};
use crate::rpc::metadata;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tonic::{Request, Response, Status};
use tracing::{debug, error};

/// StorageService implements the public gRPC API on top of any [`Storage`].
pub struct StorageService<S> {
    engine: Arc<S>,
    metrics: Arc<MetricsRegistry>,
    default_timeout: Option<Duration>,
    shutdown: CancelToken,
}

impl<S> Clone for StorageService<S> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            metrics: self.metrics.clone(),
            default_timeout: self.default_timeout,
            shutdown: self.shutdown.clone(),
        }
    }
}

impl<S: Storage> StorageService<S> {
    pub fn new(engine: Arc<S>) -> Self {
        Self {
            engine,
            metrics: Arc::new(MetricsRegistry::new()),
            default_timeout: None,
            shutdown: CancelToken::new(),
        }
    }

    /// Deadline applied when the caller sends no `grpc-timeout`.
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    pub fn engine(&self) -> &Arc<S> {
        &self.engine
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    /// Shared by every request context. Once canceled, data operations
    /// that have not started yet fail with `CANCELLED`.
    pub fn shutdown_token(&self) -> &CancelToken {
        &self.shutdown
    }

    /// Converts this service into a gRPC server instance.
    pub fn into_server(self) -> StorageServer<Self> {
        StorageServer::new(self)
    }

    fn context<T>(&self, request: &Request<T>) -> RequestContext {
        let ctx = match metadata::request_timeout(request.metadata()).or(self.default_timeout) {
            Some(timeout) => RequestContext::with_timeout(timeout),
            None => RequestContext::background(),
        };
        ctx.with_cancel(self.shutdown.clone())
    }

    /// Run one engine call, record it, and translate its outcome.
    fn dispatch<T>(
        &self,
        op: Op,
        request_id: &str,
        call: impl FnOnce(&S) -> Result<T>,
    ) -> std::result::Result<T, Status> {
        let span = tracing::info_span!("rpc", op = %op, request_id = %request_id);
        let _guard = span.enter();
        let start = Instant::now();

        let outcome = match panic::catch_unwind(AssertUnwindSafe(|| call(self.engine.as_ref()))) {
            Ok(outcome) => outcome,
            Err(payload) => Err(Error::Internal(panic_message(payload.as_ref()))),
        };

        let elapsed = start.elapsed();
        self.metrics.record(op, elapsed, outcome.is_ok());

        outcome.map_err(|e| {
            match &e {
                Error::InvalidKey(_)
                | Error::NotFound
                | Error::Canceled
                | Error::DeadlineExceeded => {
                    debug!(error = %e, elapsed_us = elapsed.as_micros() as u64, "request rejected")
                }
                _ => error!(error = %e, "request failed"),
            }
            e.to_grpc_status()
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .map_or_else(
            || "panic with non-string payload".to_string(),
            |msg| format!("panic: {}", msg),
        )
}

#[tonic::async_trait]
impl<S: Storage> StorageRpc for StorageService<S> {
    async fn heartbeat(&self, request: Request<Ping>) -> std::result::Result<Response<Pong>, Status> {
        let request_id = metadata::request_id(request.metadata());
        let alive = self.dispatch(Op::Heartbeat, &request_id, |engine| Ok(engine.heartbeat()))?;

        Ok(Response::new(Pong {
            node_id: alive.node_id,
            timestamp_ms: alive.timestamp_ms,
            uptime_ms: alive.uptime.as_millis() as u64,
        }))
    }

    async fn get(
        &self,
        request: Request<GetRequest>,
    ) -> std::result::Result<Response<GetResponse>, Status> {
        let request_id = metadata::request_id(request.metadata());
        let ctx = self.context(&request);
        let req = request.into_inner();

        let value = self.dispatch(Op::Get, &request_id, |engine| engine.get(&ctx, &req.key))?;
        Ok(Response::new(GetResponse { value }))
    }

    async fn set(&self, request: Request<SetRequest>) -> std::result::Result<Response<Ack>, Status> {
        let request_id = metadata::request_id(request.metadata());
        let ctx = self.context(&request);
        let SetRequest { key, value } = request.into_inner();

        self.dispatch(Op::Set, &request_id, |engine| engine.set(&ctx, key, value))?;
        Ok(Response::new(Ack {}))
    }

    async fn delete(
        &self,
        request: Request<DeleteRequest>,
    ) -> std::result::Result<Response<Ack>, Status> {
        let request_id = metadata::request_id(request.metadata());
        let ctx = self.context(&request);
        let req = request.into_inner();

        self.dispatch(Op::Delete, &request_id, |engine| engine.delete(&ctx, &req.key))?;
        Ok(Response::new(Ack {}))
    }
}
