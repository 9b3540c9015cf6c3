mod assignment;
mod heartbeat;
mod task;
mod timestamp;

pub use assignment::TaskAssignment;
pub use heartbeat::WorkerHeartbeat;
pub use task::{OriginalTask, RequeuedTask, TaskResult, TaskStatus};
pub use timestamp::parse_timestamp;

/// Key prefix under which workers write their heartbeat records.
pub const HEARTBEAT_KEY_PREFIX: &str = "worker_heartbeat:";

/// Key prefix under which task result records are persisted.
pub const TASK_RESULT_KEY_PREFIX: &str = "task_result:";

/// Queue consumed by workers for normal-priority tasks.
pub const STRATEGY_QUEUE: &str = "strategy_queue";

/// Queue consumed first by workers; receives high-priority and
/// `create_strategy` tasks.
pub const STRATEGY_QUEUE_PRIORITY: &str = "strategy_queue_priority";

/// Pub/sub channel for task status broadcasts.
pub const TASK_UPDATES_CHANNEL: &str = "task_updates";

/// Retention for persisted task results.
pub const TASK_RESULT_TTL_SECS: u64 = 24 * 60 * 60;

/// Full store key for a worker's heartbeat record.
pub fn heartbeat_key(worker_id: &str) -> String {
    format!("{HEARTBEAT_KEY_PREFIX}{worker_id}")
}

/// Full store key for a task's result record.
pub fn task_result_key(task_id: &str) -> String {
    format!("{TASK_RESULT_KEY_PREFIX}{task_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_construction() {
        assert_eq!(heartbeat_key("w1"), "worker_heartbeat:w1");
        assert_eq!(task_result_key("t1"), "task_result:t1");
    }
}
