//! Error types for shardkv

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // === Domain Errors ===
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Key not found")]
    NotFound,

    #[error("Request canceled")]
    Canceled,

    #[error("Deadline exceeded")]
    DeadlineExceeded,

    #[error("Internal error: {0}")]
    Internal(String),

    // === I/O Errors ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Network Errors ===
    #[error("Transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    #[error("gRPC error: {0}")]
    Grpc(tonic::Status),

    // === Config Errors ===
    #[error("Config error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Is this a retryable error?
    ///
    /// Only meaningful to callers; nothing inside the store retries.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Canceled | Error::DeadlineExceeded | Error::Transport(_) => true,
            Error::Grpc(status) => matches!(
                status.code(),
                tonic::Code::Unavailable | tonic::Code::DeadlineExceeded
            ),
            _ => false,
        }
    }

    /// Convert to gRPC status for RPC responses
    pub fn to_grpc_status(&self) -> tonic::Status {
        use tonic::{Code, Status};
        match self {
            Error::InvalidKey(_) => Status::new(Code::InvalidArgument, self.to_string()),
            Error::NotFound => Status::new(Code::NotFound, self.to_string()),
            Error::Canceled => Status::new(Code::Cancelled, self.to_string()),
            Error::DeadlineExceeded => Status::new(Code::DeadlineExceeded, self.to_string()),
            Error::Grpc(status) => status.clone(),
            // Internal details stay in the server log.
            _ => Status::new(Code::Internal, "internal error"),
        }
    }

    /// Map a status received from a server back onto the domain variants.
    pub fn from_status(status: tonic::Status) -> Self {
        use tonic::Code;
        match status.code() {
            Code::InvalidArgument => Error::InvalidKey(status.message().to_string()),
            Code::NotFound => Error::NotFound,
            Code::Cancelled => Error::Canceled,
            Code::DeadlineExceeded => Error::DeadlineExceeded,
            Code::Internal => Error::Internal(status.message().to_string()),
            _ => Error::Grpc(status),
        }
    }
}

impl From<tonic::Status> for Error {
    fn from(status: tonic::Status) -> Self {
        Error::from_status(status)
    }
}
