//! gRPC surface: service handler, server adaptor, and client

pub mod adaptor;
pub mod client;
pub mod handler;
pub mod metadata;

pub use adaptor::{RegisterFn, ServerAdaptor, ServerOptions};
pub use client::KvClient;
pub use handler::StorageService;
