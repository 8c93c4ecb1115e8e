//! Utility functions for shardkv

use chrono::Utc;
use std::time::Duration;

/// Parse duration string (e.g., "500ms", "30s", "5m", "1h", "7d")
pub fn parse_duration(s: &str) -> crate::Result<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return Err(crate::Error::InvalidConfig("empty duration".into()));
    }

    let (num_str, unit) = match s.strip_suffix("ms") {
        Some(num) => (num, "ms"),
        None => s.split_at(s.len() - s.chars().last().map_or(0, char::len_utf8)),
    };

    let num: u64 = num_str
        .parse()
        .map_err(|_| crate::Error::InvalidConfig(format!("invalid duration: {}", s)))?;

    let secs_per_unit = match unit {
        "ms" => return Ok(Duration::from_millis(num)),
        "s" => 1,
        "m" => 60,
        "h" => 3600,
        "d" => 86400,
        _ => {
            return Err(crate::Error::InvalidConfig(format!(
                "unknown duration unit: {}",
                unit
            )))
        }
    };

    num.checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| crate::Error::InvalidConfig(format!("duration out of range: {}", s)))
}

/// Get current Unix timestamp (milliseconds)
pub fn timestamp_now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Validate a key: it must contain at least one byte.
pub fn validate_key(key: &[u8]) -> crate::Result<()> {
    if key.is_empty() {
        return Err(crate::Error::InvalidKey("key must not be empty".into()));
    }
    Ok(())
}
