use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use task_monitor_core::{TaskAssignment, WorkerHeartbeat};
use tracing::{debug, warn};

/// Workers whose last heartbeat is older than `heartbeat_timeout`.
///
/// A worker with an unparseable timestamp is reported neither dead nor
/// alive; it is skipped with a warning.
pub fn find_dead_workers(
    snapshot: &HashMap<String, WorkerHeartbeat>,
    now: DateTime<Utc>,
    heartbeat_timeout: Duration,
) -> Vec<String> {
    let mut dead = Vec::new();

    for (worker_id, heartbeat) in snapshot {
        let Some(reported_at) = heartbeat.reported_at() else {
            warn!(
                "worker {} has unparseable heartbeat timestamp {:?}; skipping liveness check",
                worker_id, heartbeat.timestamp
            );
            continue;
        };

        let age = now - reported_at;
        if age > heartbeat_timeout {
            debug!(
                "worker {} heartbeat is {}s old (limit {}s)",
                worker_id,
                age.num_seconds(),
                heartbeat_timeout.num_seconds()
            );
            dead.push(worker_id.clone());
        }
    }

    dead
}

/// Tasks whose derived running time exceeds `task_timeout`, regardless of
/// whether the worker is still alive. The snapshot only decides which case
/// the log line reports.
pub fn find_stuck_tasks(
    assignments: &HashMap<String, TaskAssignment>,
    snapshot: &HashMap<String, WorkerHeartbeat>,
    now: DateTime<Utc>,
    task_timeout: Duration,
) -> Vec<TaskAssignment> {
    let mut stuck = Vec::new();

    for assignment in assignments.values() {
        let elapsed = assignment.elapsed(now);
        if elapsed <= task_timeout {
            continue;
        }

        let worker_known = snapshot.contains_key(&assignment.worker_id);
        debug!(
            "task {} stuck after {}s on {} worker {}",
            assignment.task_id,
            elapsed.num_seconds(),
            if worker_known { "live" } else { "unknown" },
            assignment.worker_id
        );
        stuck.push(assignment.clone());
    }

    stuck
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn test_stale_heartbeat_is_dead() {
        let now = Utc::now();
        let snapshot = snapshot_of(vec![
            heartbeat("fresh", &(now - Duration::seconds(3)).to_rfc3339(), None),
            heartbeat("stale", &(now - Duration::seconds(30)).to_rfc3339(), None),
        ]);

        let dead = find_dead_workers(&snapshot, now, Duration::seconds(10));
        assert_eq!(dead, vec!["stale".to_string()]);
    }

    #[test]
    fn test_heartbeat_at_exact_timeout_is_alive() {
        let now = Utc::now();
        let snapshot = snapshot_of(vec![heartbeat(
            "w1",
            &(now - Duration::seconds(10)).to_rfc3339(),
            None,
        )]);

        // Strictly greater-than: exactly at the limit is still alive.
        assert!(find_dead_workers(&snapshot, now, Duration::seconds(10)).is_empty());
    }

    #[test]
    fn test_unparseable_timestamp_is_skipped() {
        let now = Utc::now();
        let snapshot = snapshot_of(vec![heartbeat("w1", "??:??", None)]);

        let dead = find_dead_workers(&snapshot, now, Duration::seconds(10));
        assert!(dead.is_empty());
    }

    #[test]
    fn test_long_running_task_is_stuck_even_on_live_worker() {
        let now = Utc::now();
        let started = now - Duration::seconds(400);
        let snapshot = snapshot_of(vec![heartbeat("w1", &now.to_rfc3339(), Some("t1"))]);
        let mut assignments = HashMap::new();
        assignments.insert(
            "t1".to_string(),
            TaskAssignment::new("w1".to_string(), "t1".to_string(), started),
        );

        let stuck = find_stuck_tasks(&assignments, &snapshot, now, Duration::seconds(300));
        assert_eq!(stuck.len(), 1);
        assert_eq!(stuck[0].task_id, "t1");
    }

    #[test]
    fn test_recent_task_is_not_stuck() {
        let now = Utc::now();
        let mut assignments = HashMap::new();
        assignments.insert(
            "t1".to_string(),
            TaskAssignment::new("w1".to_string(), "t1".to_string(), now - Duration::seconds(60)),
        );

        let stuck = find_stuck_tasks(&assignments, &HashMap::new(), now, Duration::seconds(300));
        assert!(stuck.is_empty());
    }
}
