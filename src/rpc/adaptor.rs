//! Server adaptor: binds a [`StorageService`] to a tonic server.
//!
//! Registration is split from serving. [`ServerAdaptor::register`] returns
//! a function that wires the service into any `Server`, so tests can mount
//! the handler on a server they build themselves.

use crate::common::Result;
use crate::engine::Storage;
use crate::proto::storage_server::StorageServer;
use crate::rpc::handler::StorageService;
use std::future::Future;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::server::Router;
use tonic::transport::Server;

/// Wires a handler into a server instance
pub type RegisterFn = Box<dyn FnOnce(&mut Server) -> Router + Send>;

/// Transport-level settings applied to the tonic server
#[derive(Debug, Clone, Default)]
pub struct ServerOptions {
    /// Upper bound on any request's run time, enforced by tonic
    pub timeout: Option<Duration>,
    pub concurrency_limit_per_connection: Option<usize>,
}

pub struct ServerAdaptor<S> {
    service: StorageService<S>,
    server: Server,
}

impl<S: Storage> ServerAdaptor<S> {
    pub fn new(service: StorageService<S>) -> Self {
        Self::with_options(service, ServerOptions::default())
    }

    pub fn with_options(service: StorageService<S>, options: ServerOptions) -> Self {
        let mut server = Server::builder();
        if let Some(timeout) = options.timeout {
            server = server.timeout(timeout);
        }
        if let Some(limit) = options.concurrency_limit_per_connection {
            server = server.concurrency_limit_per_connection(limit);
        }
        Self { service, server }
    }

    pub fn service(&self) -> &StorageService<S> {
        &self.service
    }

    /// Returns a function that registers the storage service on a server.
    pub fn register(&self) -> RegisterFn {
        let service = self.service.clone();
        Box::new(move |server: &mut Server| server.add_service(StorageServer::new(service)))
    }

    /// Serve on `listener` until the transport fails.
    pub async fn run(self, listener: TcpListener) -> Result<()> {
        self.run_until(listener, std::future::pending()).await
    }

    /// Serve on `listener` until `shutdown` resolves or the transport fails.
    ///
    /// When `shutdown` resolves the service's shutdown token is canceled:
    /// requests still queued during the drain fail with `CANCELLED`.
    pub async fn run_until<F>(mut self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let addr = listener.local_addr()?;
        let register = self.register();
        let router = register(&mut self.server);

        let token = self.service.shutdown_token().clone();
        let shutdown = async move {
            shutdown.await;
            token.cancel();
        };

        tracing::info!("gRPC server listening on {}", addr);
        router
            .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown)
            .await?;
        tracing::info!("gRPC server on {} stopped", addr);
        Ok(())
    }
}
