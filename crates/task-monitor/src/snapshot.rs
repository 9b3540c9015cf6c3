use crate::Result;
use std::collections::HashMap;
use task_monitor_core::{WorkerHeartbeat, HEARTBEAT_KEY_PREFIX};
use task_monitor_store::SharedStore;
use tracing::{debug, warn};

/// Pull every current worker heartbeat from the store.
///
/// Failing to enumerate keys is a hard error and the cycle takes no action.
/// A single missing, unreadable, or malformed entry is logged and skipped.
pub async fn read_heartbeats(
    store: &dyn SharedStore,
) -> Result<HashMap<String, WorkerHeartbeat>> {
    let keys = store.keys(HEARTBEAT_KEY_PREFIX).await?;

    let mut snapshot = HashMap::with_capacity(keys.len());
    for key in keys {
        let raw = match store.get(&key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                // Worker deregistered (or expired) between list and fetch.
                debug!("heartbeat key {} vanished during snapshot", key);
                continue;
            }
            Err(e) => {
                warn!("failed to fetch heartbeat {}: {}", key, e);
                continue;
            }
        };

        match serde_json::from_str::<WorkerHeartbeat>(&raw) {
            Ok(heartbeat) => {
                snapshot.insert(heartbeat.worker_id.clone(), heartbeat);
            }
            Err(e) => warn!("skipping malformed heartbeat at {}: {}", key, e),
        }
    }

    Ok(snapshot)
}
