use chrono::{DateTime, Utc};
use std::collections::HashMap;
use task_monitor_core::{TaskAssignment, WorkerHeartbeat};
use tracing::debug;

/// Reconstruct the in-flight task-to-worker mapping from a heartbeat
/// snapshot.
///
/// Pure function of its inputs; nothing is persisted and the mapping is
/// rebuilt every cycle. Idle workers contribute nothing. `started_at` is
/// the heartbeat's timestamp, falling back to `now` when unparsable so a
/// bad timestamp cannot manufacture a falsely-ancient stuck task. When two
/// workers claim the same task, the newer `started_at` wins.
pub fn derive_assignments(
    snapshot: &HashMap<String, WorkerHeartbeat>,
    now: DateTime<Utc>,
) -> HashMap<String, TaskAssignment> {
    let mut assignments: HashMap<String, TaskAssignment> = HashMap::new();

    for (worker_id, heartbeat) in snapshot {
        let Some(task_id) = heartbeat.active_task() else {
            continue;
        };

        let started_at = heartbeat.reported_at().unwrap_or(now);
        let assignment = TaskAssignment::new(worker_id.clone(), task_id.to_string(), started_at);

        match assignments.get(task_id) {
            Some(existing) if existing.started_at >= started_at => {
                debug!(
                    "task {} claimed by both {} and {}; keeping the newer claim",
                    task_id, existing.worker_id, worker_id
                );
            }
            _ => {
                assignments.insert(task_id.to_string(), assignment);
            }
        }
    }

    assignments
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use task_monitor_core::TaskStatus;

    fn heartbeat(worker_id: &str, timestamp: &str, task_id: Option<&str>) -> WorkerHeartbeat {
        serde_json::from_value(serde_json::json!({
            "worker_id": worker_id,
            "timestamp": timestamp,
            "active_task_id": task_id,
        }))
        .unwrap()
    }

    fn snapshot_of(heartbeats: Vec<WorkerHeartbeat>) -> HashMap<String, WorkerHeartbeat> {
        heartbeats
            .into_iter()
            .map(|hb| (hb.worker_id.clone(), hb))
            .collect()
    }

    #[test]
    fn test_idle_workers_are_skipped() {
        let now = Utc::now();
        let snapshot = snapshot_of(vec![
            heartbeat("w1", &now.to_rfc3339(), None),
            heartbeat("w2", &now.to_rfc3339(), Some("")),
            heartbeat("w3", &now.to_rfc3339(), Some("t3")),
        ]);

        let assignments = derive_assignments(&snapshot, now);
        assert_eq!(assignments.len(), 1);
        let assignment = &assignments["t3"];
        assert_eq!(assignment.worker_id, "w3");
        assert_eq!(assignment.status, TaskStatus::Running);
    }

    #[test]
    fn test_started_at_comes_from_heartbeat() {
        let now = Utc::now();
        let reported = now - Duration::seconds(90);
        let snapshot = snapshot_of(vec![heartbeat("w1", &reported.to_rfc3339(), Some("t1"))]);

        let assignments = derive_assignments(&snapshot, now);
        assert_eq!(assignments["t1"].started_at.timestamp(), reported.timestamp());
    }

    #[test]
    fn test_unparseable_timestamp_falls_back_to_now() {
        let now = Utc::now();
        let snapshot = snapshot_of(vec![heartbeat("w1", "garbage", Some("t1"))]);

        let assignments = derive_assignments(&snapshot, now);
        assert_eq!(assignments["t1"].started_at, now);
    }

    #[test]
    fn test_duplicate_task_newest_claim_wins() {
        let now = Utc::now();
        let older = now - Duration::seconds(60);
        let snapshot = snapshot_of(vec![
            heartbeat("w1", &older.to_rfc3339(), Some("t1")),
            heartbeat("w2", &now.to_rfc3339(), Some("t1")),
        ]);

        let assignments = derive_assignments(&snapshot, now);
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments["t1"].worker_id, "w2");
    }
}
