use crate::common::{Error, Result};
use crate::proto::storage_client::StorageClient;
use crate::proto::{DeleteRequest, GetRequest, Ping, Pong, SetRequest};
use bytes::Bytes;
use std::time::{Duration, Instant};
use tonic::transport::Channel;
use tonic::Status;

/// Typed client for the storage service.
///
/// Error statuses come back as the matching [`crate::Error`] variant. The
/// tonic server answers a request whose `grpc-timeout` ran out before the
/// handler with `CANCELLED`; once this client's own deadline has passed,
/// that is reported as [`Error::DeadlineExceeded`].
#[derive(Debug, Clone)]
pub struct KvClient {
    client: StorageClient<Channel>,
    timeout: Option<Duration>,
}

impl KvClient {
    pub async fn connect(endpoint: impl Into<String>) -> Result<Self> {
        let client = StorageClient::connect(endpoint.into()).await?;
        Ok(Self {
            client,
            timeout: None,
        })
    }

    /// Send this deadline (as `grpc-timeout`) with every call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn request<T>(&self, message: T) -> tonic::Request<T> {
        let mut request = tonic::Request::new(message);
        if let Some(timeout) = self.timeout {
            request.set_timeout(timeout);
        }
        request
    }

    fn error(&self, started: Instant, status: Status) -> Error {
        match Error::from(status) {
            Error::Canceled if self.timeout.is_some_and(|t| started.elapsed() >= t) => {
                Error::DeadlineExceeded
            }
            e => e,
        }
    }

    pub async fn heartbeat(&mut self) -> Result<Pong> {
        let request = self.request(Ping {});
        let started = Instant::now();
        let response = self
            .client
            .heartbeat(request)
            .await
            .map_err(|s| self.error(started, s))?;
        Ok(response.into_inner())
    }

    pub async fn get(&mut self, key: impl Into<Bytes>) -> Result<Bytes> {
        let request = self.request(GetRequest { key: key.into() });
        let started = Instant::now();
        let response = self
            .client
            .get(request)
            .await
            .map_err(|s| self.error(started, s))?;
        Ok(response.into_inner().value)
    }

    pub async fn set(&mut self, key: impl Into<Bytes>, value: impl Into<Bytes>) -> Result<()> {
        let request = self.request(SetRequest {
            key: key.into(),
            value: value.into(),
        });
        let started = Instant::now();
        self.client
            .set(request)
            .await
            .map_err(|s| self.error(started, s))?;
        Ok(())
    }

    pub async fn delete(&mut self, key: impl Into<Bytes>) -> Result<()> {
        let request = self.request(DeleteRequest { key: key.into() });
        let started = Instant::now();
        self.client
            .delete(request)
            .await
            .map_err(|s| self.error(started, s))?;
        Ok(())
    }
}
