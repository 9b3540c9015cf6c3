use serde::{Deserialize, Serialize};

/// Tunables for the monitor loop, all overridable at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// A worker whose last heartbeat is older than this is dead.
    pub heartbeat_timeout_secs: u64,

    /// A task running longer than this is stuck.
    pub task_timeout_secs: u64,

    /// Interval between monitoring cycles.
    pub check_interval_secs: u64,

    /// Requeue budget per task before it is marked terminally failed.
    pub max_retries: u32,

    /// Retention for persisted task results.
    pub result_ttl_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig {
            heartbeat_timeout_secs: 10,
            task_timeout_secs: 300,
            check_interval_secs: 5,
            max_retries: 3,
            result_ttl_secs: task_monitor_core::TASK_RESULT_TTL_SECS,
        }
    }
}

impl MonitorConfig {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: MonitorConfig = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    pub fn heartbeat_timeout(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.heartbeat_timeout_secs as i64)
    }

    pub fn task_timeout(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.task_timeout_secs as i64)
    }

    pub fn check_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.check_interval_secs)
    }

    pub fn result_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.result_ttl_secs)
    }
}
