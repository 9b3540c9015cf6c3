use crate::{MonitorError, Result};
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use task_monitor_core::{
    heartbeat_key, task_result_key, RequeuedTask, TaskAssignment, TaskResult, TaskStatus,
    STRATEGY_QUEUE, STRATEGY_QUEUE_PRIORITY, TASK_UPDATES_CHANNEL,
};
use task_monitor_store::SharedStore;
use tracing::{error, info, warn};

/// Cumulative recovery counters, shared with the monitor for reporting.
#[derive(Debug, Default)]
pub struct RecoveryCounters {
    pub dead_workers_detected: u64,
    pub tasks_recovered: u64,
    pub stuck_tasks_recovered: u64,
    pub failed_recoveries: u64,
}

/// What a requeue attempt decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequeueOutcome {
    /// Task pushed back to a queue with an incremented retry count.
    Requeued,
    /// Retry budget exhausted; task marked terminally failed, nothing pushed.
    RetriesExhausted,
}

/// Orchestrates cleanup of dead workers and recovery of stuck tasks.
///
/// Every entry point is idempotent per call: re-running recovery on an
/// already-requeued task only increments its retry count again, bounded by
/// the retry budget. Recovery failures never propagate out of the
/// coordinator; they are counted, logged, and the task is left in its prior
/// state for a future cycle.
pub struct RecoveryCoordinator {
    store: Arc<dyn SharedStore>,
    max_retries: u32,
    result_ttl: std::time::Duration,
    counters: Arc<Mutex<RecoveryCounters>>,
}

impl RecoveryCoordinator {
    pub fn new(
        store: Arc<dyn SharedStore>,
        max_retries: u32,
        result_ttl: std::time::Duration,
        counters: Arc<Mutex<RecoveryCounters>>,
    ) -> Self {
        RecoveryCoordinator {
            store,
            max_retries,
            result_ttl,
            counters,
        }
    }

    /// Clean up a dead worker: drop its heartbeat key and requeue everything
    /// it was running.
    ///
    /// The heartbeat key is deleted even when the worker had no assigned
    /// tasks, so a zombie key cannot suppress detection on later cycles.
    pub async fn recover_dead_worker(
        &self,
        worker_id: &str,
        assignments: &HashMap<String, TaskAssignment>,
    ) {
        info!("recovering dead worker {}", worker_id);

        match self.store.delete(&heartbeat_key(worker_id)).await {
            Ok(existed) => {
                if !existed {
                    // Another cycle (or the worker itself) already removed it.
                    info!("heartbeat key for {} was already gone", worker_id);
                }
            }
            Err(e) => warn!("failed to delete heartbeat for {}: {}", worker_id, e),
        }
        self.counters.lock().dead_workers_detected += 1;

        let assigned: Vec<&TaskAssignment> = assignments
            .values()
            .filter(|a| a.worker_id == worker_id)
            .collect();

        for assignment in assigned {
            let outcome = self
                .requeue_task(&assignment.task_id, "worker died (heartbeat timeout)")
                .await;
            self.tally(&assignment.task_id, outcome, false);
        }
    }

    /// Recover a task that has exceeded its runtime limit.
    pub async fn recover_stuck_task(
        &self,
        assignment: &TaskAssignment,
        now: DateTime<Utc>,
        task_timeout: Duration,
    ) {
        let reason = format!(
            "task stuck: running for {}s, limit {}s",
            assignment.elapsed(now).num_seconds(),
            task_timeout.num_seconds()
        );
        let outcome = self.requeue_task(&assignment.task_id, &reason).await;
        self.tally(&assignment.task_id, outcome, true);
    }

    fn tally(&self, task_id: &str, outcome: Result<RequeueOutcome>, stuck: bool) {
        let mut counters = self.counters.lock();
        match outcome {
            Ok(RequeueOutcome::Requeued) => {
                counters.tasks_recovered += 1;
                if stuck {
                    counters.stuck_tasks_recovered += 1;
                }
            }
            Ok(RequeueOutcome::RetriesExhausted) => {
                counters.failed_recoveries += 1;
            }
            Err(e) => {
                error!("failed to recover task {}: {}", task_id, e);
                counters.failed_recoveries += 1;
            }
        }
    }

    /// Apply the requeue policy to one task.
    ///
    /// Loads the task's result record, checks the retry budget, rebuilds a
    /// queue entry from the stored original task (best-effort defaults when
    /// absent), pushes it to the front of exactly one queue, and persists
    /// the record as queued. With the budget exhausted, the record is
    /// instead marked terminally failed and nothing is pushed.
    pub async fn requeue_task(&self, task_id: &str, reason: &str) -> Result<RequeueOutcome> {
        let key = task_result_key(task_id);
        let raw = self
            .store
            .get(&key)
            .await?
            .ok_or_else(|| MonitorError::TaskResultMissing(task_id.to_string()))?;
        let mut result: TaskResult =
            serde_json::from_str(&raw).map_err(|source| MonitorError::TaskResultMalformed {
                task_id: task_id.to_string(),
                source,
            })?;

        let retry_count = result.retry_count();
        if retry_count >= self.max_retries {
            warn!(
                "task {} exhausted its retry budget ({}/{}); marking failed",
                task_id, retry_count, self.max_retries
            );
            result.status = TaskStatus::Failed;
            result.data.insert(
                "failure_reason".into(),
                json!(format!("max retries exceeded: {reason}")),
            );
            result
                .data
                .insert("failed_at".into(), json!(Utc::now().to_rfc3339()));
            self.persist_result(&result).await?;
            self.broadcast_status(&result, reason).await;
            return Ok(RequeueOutcome::RetriesExhausted);
        }
        let retry_count = retry_count + 1;

        let original = result.original_task().unwrap_or_default();
        let queue = if original.task_type == "create_strategy" || original.priority == "high" {
            STRATEGY_QUEUE_PRIORITY
        } else {
            STRATEGY_QUEUE
        };

        let mut args = original.args.clone();
        args.insert("retry_count".into(), Value::from(retry_count));
        args.insert("retry_reason".into(), Value::from(reason));
        let requeued = RequeuedTask {
            task_id: task_id.to_string(),
            task_type: original.task_type,
            args,
            created_at: Utc::now(),
            priority: original.priority,
        };
        self.store
            .push_front(queue, &serde_json::to_string(&requeued)?)
            .await?;

        result.status = TaskStatus::Queued;
        result.set_retry_count(retry_count);
        result.data.insert("retry_reason".into(), json!(reason));
        result
            .data
            .insert("requeued_at".into(), json!(requeued.created_at.to_rfc3339()));
        self.persist_result(&result).await?;
        self.broadcast_status(&result, reason).await;

        info!(
            "requeued task {} to {} (attempt {}): {}",
            task_id, queue, retry_count, reason
        );
        Ok(RequeueOutcome::Requeued)
    }

    async fn persist_result(&self, result: &TaskResult) -> Result<()> {
        let key = task_result_key(&result.task_id);
        self.store
            .set_with_ttl(&key, &serde_json::to_string(result)?, self.result_ttl)
            .await?;
        Ok(())
    }

    /// Best-effort status broadcast; a failed publish never fails a recovery.
    async fn broadcast_status(&self, result: &TaskResult, reason: &str) {
        let message = json!({
            "task_id": result.task_id,
            "status": result.status.as_str(),
            "retry_count": result.retry_count(),
            "reason": reason,
            "timestamp": Utc::now().to_rfc3339(),
        });
        if let Err(e) = self
            .store
            .publish(TASK_UPDATES_CHANNEL, &message.to_string())
            .await
        {
            warn!("failed to broadcast status for task {}: {}", result.task_id, e);
        }
    }
}
