use crate::recovery::RecoveryCounters;
use crate::MonitorConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time view of the monitor, produced by the read-only stats path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringStats {
    /// Workers with a current heartbeat record.
    pub active_workers: usize,
    /// Derived in-flight task assignments.
    pub active_tasks: usize,
    /// Workers the dead-worker detector would flag right now.
    pub dead_workers: usize,
    /// Tasks the stuck-task detector would flag right now.
    pub stuck_tasks: usize,
    /// Whether the monitor loop is running.
    pub running: bool,
    /// When the loop last completed a cycle, if it has.
    pub last_check: Option<DateTime<Utc>>,
    /// The active configuration.
    pub config: MonitorConfig,
    /// Cumulative recovery counters.
    pub recovery: RecoveryStats,
}

/// Cumulative recovery counters plus a derived success rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryStats {
    pub dead_workers_detected: u64,
    pub tasks_recovered: u64,
    pub stuck_tasks_recovered: u64,
    pub failed_recoveries: u64,
    pub success_rate: f64,
}

impl From<&RecoveryCounters> for RecoveryStats {
    fn from(counters: &RecoveryCounters) -> Self {
        let attempts = counters.tasks_recovered + counters.failed_recoveries;
        let success_rate = if attempts == 0 {
            1.0
        } else {
            counters.tasks_recovered as f64 / attempts as f64
        };
        RecoveryStats {
            dead_workers_detected: counters.dead_workers_detected,
            tasks_recovered: counters.tasks_recovered,
            stuck_tasks_recovered: counters.stuck_tasks_recovered,
            failed_recoveries: counters.failed_recoveries,
            success_rate,
        }
    }
}
