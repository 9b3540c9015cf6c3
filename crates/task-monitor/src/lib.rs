pub mod assignments;
pub mod config;
pub mod detectors;
pub mod error;
pub mod monitor;
pub mod recovery;
pub mod snapshot;
pub mod stats;

pub use config::MonitorConfig;
pub use error::{MonitorError, Result};
pub use monitor::WorkerMonitor;
pub use recovery::{RecoveryCoordinator, RequeueOutcome};
pub use stats::{MonitoringStats, RecoveryStats};
