use crate::timestamp::parse_timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Last-known liveness report of one worker.
///
/// Written by the worker process at a fixed cadence; the monitor only reads
/// these records, and deletes the key once the worker is judged dead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerHeartbeat {
    /// Unique worker identity, also the key suffix.
    pub worker_id: String,

    /// Free-form status string reported by the worker (e.g. "idle",
    /// "processing").
    #[serde(default)]
    pub status: String,

    /// Wall-clock time of the report. Kept as the raw string because workers
    /// emit several formats; see [`parse_timestamp`].
    pub timestamp: String,

    /// Worker uptime in seconds.
    #[serde(default)]
    pub uptime_seconds: f64,

    /// Task the worker is currently processing. Absent or empty means idle.
    #[serde(default)]
    pub active_task_id: Option<String>,

    /// Opaque per-worker queue statistics; never interpreted by the monitor.
    #[serde(default)]
    pub queue_stats: HashMap<String, Value>,
}

impl WorkerHeartbeat {
    /// The task this worker is processing, treating an empty string as idle.
    pub fn active_task(&self) -> Option<&str> {
        match self.active_task_id.as_deref() {
            Some("") | None => None,
            Some(task_id) => Some(task_id),
        }
    }

    /// The report time in UTC, if the raw timestamp is in any accepted format.
    pub fn reported_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.timestamp)
    }
}
