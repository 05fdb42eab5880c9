use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::Result;

/// One sampling tick's worth of readings, as emitted by machine-readable output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickRecord<R> {
    /// Unix epoch milliseconds when the tick finished.
    pub timestamp: i64,

    /// Host the readings were taken on.
    pub host: String,

    /// 1-based tick counter since startup.
    pub tick: u64,

    /// Per-source readings, in registration order.
    pub readings: Vec<R>,
}

impl<R> TickRecord<R> {
    /// Create a new record stamped with the current time.
    pub fn new(host: impl Into<String>, tick: u64, readings: Vec<R>) -> Self {
        Self {
            timestamp: current_timestamp_millis(),
            host: host.into(),
            tick,
            readings,
        }
    }
}

impl<R: Serialize> TickRecord<R> {
    /// Encode as a single line of JSON (no trailing newline).
    pub fn to_json_line(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Get the current timestamp in milliseconds since Unix epoch.
///
/// Returns 0 if system time is before Unix epoch (should never happen in practice).
pub fn current_timestamp_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
