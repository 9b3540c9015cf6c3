use crate::TaskStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A derived task-to-worker binding, synthesized from a heartbeat that
/// reports a non-empty active task.
///
/// Assignments are never persisted: they are recomputed from the heartbeat
/// snapshot on every monitoring cycle and do not outlive it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskAssignment {
    pub worker_id: String,
    pub task_id: String,

    /// Start time attributed to the task: the heartbeat's own timestamp, or
    /// the snapshot time when that timestamp cannot be parsed.
    pub started_at: DateTime<Utc>,

    /// Always [`TaskStatus::Running`] for a derived assignment.
    pub status: TaskStatus,
}

impl TaskAssignment {
    pub fn new(worker_id: String, task_id: String, started_at: DateTime<Utc>) -> Self {
        TaskAssignment {
            worker_id,
            task_id,
            started_at,
            status: TaskStatus::Running,
        }
    }

    /// How long the task has been running as of `now`.
    pub fn elapsed(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.started_at
    }
}
