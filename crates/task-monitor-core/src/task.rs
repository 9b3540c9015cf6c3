use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Task status in the result record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Task submitted but not yet queued.
    Pending,
    /// Task is waiting in a queue for a worker.
    Queued,
    /// Task is being processed by a worker.
    Running,
    /// Task completed successfully.
    Completed,
    /// Task failed terminally; no further automatic recovery.
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Queued => "queued",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }
}

/// The authoritative persisted record for a task, addressed by task id.
///
/// Workers write progress and completion into it; the recovery path rewrites
/// it on requeue or terminal failure. The monitor never deletes these; they
/// age out via the store's TTL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    pub task_id: String,
    pub status: TaskStatus,

    /// Retry bookkeeping and whatever else the worker stashed here. At
    /// minimum `retry_count`; optionally `original_task` for reconstruction.
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl TaskResult {
    pub fn new(task_id: impl Into<String>, status: TaskStatus) -> Self {
        TaskResult {
            task_id: task_id.into(),
            status,
            data: Map::new(),
        }
    }

    /// Current retry count; a missing or non-numeric field reads as 0.
    pub fn retry_count(&self) -> u32 {
        self.data
            .get("retry_count")
            .and_then(Value::as_u64)
            .unwrap_or(0) as u32
    }

    pub fn set_retry_count(&mut self, count: u32) {
        self.data.insert("retry_count".into(), Value::from(count));
    }

    /// The original task description, when the submitter recorded one.
    /// Malformed `original_task` data reads as absent.
    pub fn original_task(&self) -> Option<OriginalTask> {
        let value = self.data.get("original_task")?;
        serde_json::from_value(value.clone()).ok()
    }

    pub fn set_original_task(&mut self, original: &OriginalTask) {
        if let Ok(value) = serde_json::to_value(original) {
            self.data.insert("original_task".into(), value);
        }
    }
}

fn default_task_type() -> String {
    "backtest".to_string()
}

fn default_priority() -> String {
    "normal".to_string()
}

/// Description of a task as originally submitted, stored inside the result
/// record so a recovery can rebuild a queue entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OriginalTask {
    #[serde(default = "default_task_type")]
    pub task_type: String,

    #[serde(default = "default_priority")]
    pub priority: String,

    #[serde(default)]
    pub args: Map<String, Value>,
}

impl Default for OriginalTask {
    /// Best-effort fallback when the result record carries no
    /// `original_task`: the retry bookkeeping survives even if the exact
    /// payload cannot be reconstructed.
    fn default() -> Self {
        OriginalTask {
            task_type: default_task_type(),
            priority: default_priority(),
            args: Map::new(),
        }
    }
}

/// A fresh queue entry built from an [`OriginalTask`] during recovery.
/// Owned by whichever worker next dequeues it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequeuedTask {
    pub task_id: String,
    pub task_type: String,
    pub args: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub priority: String,
}
