use task_monitor_store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Task result not found for task {0}")]
    TaskResultMissing(String),

    #[error("Malformed task result for task {task_id}: {source}")]
    TaskResultMalformed {
        task_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MonitorError>;
