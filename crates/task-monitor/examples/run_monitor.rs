//! Runs the monitor against an in-memory store seeded with one dead worker
//! holding a task, then prints the resulting stats.
//!
//! ```sh
//! cargo run -p task-monitor --example run_monitor
//! ```

use chrono::{Duration, Utc};
use serde_json::json;
use std::sync::Arc;
use task_monitor::{MonitorConfig, WorkerMonitor};
use task_monitor_core::{heartbeat_key, task_result_key, STRATEGY_QUEUE};
use task_monitor_store::{MemoryStore, SharedStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let store = Arc::new(MemoryStore::new());

    // One healthy idle worker and one that stopped heartbeating 30s ago
    // while running task bt_1001.
    store.set(
        &heartbeat_key("worker-1"),
        &json!({
            "worker_id": "worker-1",
            "status": "idle",
            "timestamp": Utc::now().to_rfc3339(),
            "uptime_seconds": 3600.0,
        })
        .to_string(),
    );
    store.set(
        &heartbeat_key("worker-2"),
        &json!({
            "worker_id": "worker-2",
            "status": "processing",
            "timestamp": (Utc::now() - Duration::seconds(30)).to_rfc3339(),
            "uptime_seconds": 120.0,
            "active_task_id": "bt_1001",
        })
        .to_string(),
    );
    store.set(
        &task_result_key("bt_1001"),
        &json!({
            "task_id": "bt_1001",
            "status": "running",
            "data": {
                "retry_count": 0,
                "original_task": {
                    "task_type": "backtest",
                    "priority": "normal",
                    "args": {"symbol": "BTCUSDT", "interval": "1h"}
                }
            }
        })
        .to_string(),
    );

    let monitor = Arc::new(WorkerMonitor::new(
        store.clone() as Arc<dyn SharedStore>,
        MonitorConfig {
            check_interval_secs: 1,
            ..MonitorConfig::default()
        },
    ));

    monitor.start();
    tokio::time::sleep(std::time::Duration::from_secs(2)).await;
    monitor.stop();

    let stats = monitor.stats().await?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    println!(
        "requeued entries waiting in {}: {}",
        STRATEGY_QUEUE,
        store.queue_len(STRATEGY_QUEUE)
    );

    Ok(())
}
