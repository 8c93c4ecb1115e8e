//! Request metadata helpers: deadlines and request IDs

use std::time::Duration;
use tonic::metadata::MetadataMap;
use uuid::Uuid;

/// Header carrying the caller's deadline, set by gRPC clients
pub const GRPC_TIMEOUT_HEADER: &str = "grpc-timeout";

/// Header name for request ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Parse a `grpc-timeout` value: up to 8 ASCII digits followed by one of
/// `H M S m u n`.
pub fn parse_grpc_timeout(value: &str) -> Option<Duration> {
    if !value.is_ascii() || value.len() < 2 {
        return None;
    }
    let (digits, unit) = value.split_at(value.len() - 1);
    if digits.len() > 8 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let n: u64 = digits.parse().ok()?;

    let timeout = match unit {
        "H" => Duration::from_secs(n * 3600),
        "M" => Duration::from_secs(n * 60),
        "S" => Duration::from_secs(n),
        "m" => Duration::from_millis(n),
        "u" => Duration::from_micros(n),
        "n" => Duration::from_nanos(n),
        _ => return None,
    };
    Some(timeout)
}

/// Timeout requested by the caller, if any. Malformed values are ignored.
pub fn request_timeout(metadata: &MetadataMap) -> Option<Duration> {
    metadata
        .get(GRPC_TIMEOUT_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_grpc_timeout)
}

/// Caller-supplied request ID, or a fresh one
pub fn request_id(metadata: &MetadataMap) -> String {
    metadata
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .unwrap_or_else(generate_request_id)
}

/// Generate a new unique request ID
pub fn generate_request_id() -> String {
    Uuid::new_v4().to_string()
}
