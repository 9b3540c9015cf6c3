use crate::{Result, SharedStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<DateTime<Utc>>,
}

impl Entry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// In-memory [`SharedStore`] for tests and local development.
///
/// Expired entries become invisible on observation and are removed lazily.
/// Published messages are recorded so tests can assert on broadcasts.
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, Entry>,
    queues: Mutex<HashMap<String, VecDeque<String>>>,
    published: Mutex<Vec<(String, String)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Write a value without expiry, outside the trait. Test seeding helper.
    pub fn set(&self, key: &str, value: &str) {
        self.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: None,
            },
        );
    }

    /// Number of entries waiting in the named queue.
    pub fn queue_len(&self, queue: &str) -> usize {
        self.queues
            .lock()
            .get(queue)
            .map(VecDeque::len)
            .unwrap_or(0)
    }

    /// Every `(channel, message)` pair published so far, in order.
    pub fn published(&self) -> Vec<(String, String)> {
        self.published.lock().clone()
    }
}

#[async_trait]
impl SharedStore for MemoryStore {
    async fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        let now = Utc::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        let dropped = before - self.entries.len();
        if dropped > 0 {
            debug!("dropped {} expired entries", dropped);
        }
        Ok(self
            .entries
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| entry.key().clone())
            .collect())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = Utc::now();
        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired(now) {
                return Ok(Some(entry.value.clone()));
            }
        }
        self.entries.remove_if(key, |_, entry| entry.is_expired(now));
        Ok(None)
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        // An unrepresentably large ttl degrades to no expiry.
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| Utc::now().checked_add_signed(ttl));
        self.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.entries.remove(key).is_some())
    }

    async fn push_front(&self, queue: &str, value: &str) -> Result<()> {
        self.queues
            .lock()
            .entry(queue.to_string())
            .or_default()
            .push_front(value.to_string());
        Ok(())
    }

    async fn pop_back(&self, queue: &str) -> Result<Option<String>> {
        Ok(self
            .queues
            .lock()
            .get_mut(queue)
            .and_then(VecDeque::pop_back))
    }

    async fn publish(&self, channel: &str, message: &str) -> Result<usize> {
        self.published
            .lock()
            .push((channel.to_string(), message.to_string()));
        // No live subscribers in the in-memory store.
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_delete() {
        let store = MemoryStore::new();
        store.set("k1", "v1");

        assert_eq!(store.get("k1").await.unwrap(), Some("v1".to_string()));
        assert!(store.delete("k1").await.unwrap());
        assert!(!store.delete("k1").await.unwrap());
        assert_eq!(store.get("k1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_keys_filters_by_prefix() {
        let store = MemoryStore::new();
        store.set("worker_heartbeat:w1", "{}");
        store.set("worker_heartbeat:w2", "{}");
        store.set("task_result:t1", "{}");

        let mut keys = store.keys("worker_heartbeat:").await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["worker_heartbeat:w1", "worker_heartbeat:w2"]);
    }

    #[tokio::test]
    async fn test_ttl_expiry() {
        let store = MemoryStore::new();
        store
            .set_with_ttl("k1", "v1", Duration::from_secs(0))
            .await
            .unwrap();
        assert_eq!(store.get("k1").await.unwrap(), None);
        assert!(store.keys("k").await.unwrap().is_empty());

        store
            .set_with_ttl("k2", "v2", Duration::from_secs(3600))
            .await
            .unwrap();
        assert_eq!(store.get("k2").await.unwrap(), Some("v2".to_string()));
    }

    #[tokio::test]
    async fn test_queue_is_fifo_from_the_back() {
        let store = MemoryStore::new();
        store.push_front("q", "first").await.unwrap();
        store.push_front("q", "second").await.unwrap();

        assert_eq!(store.queue_len("q"), 2);
        assert_eq!(store.pop_back("q").await.unwrap(), Some("first".to_string()));
        assert_eq!(store.pop_back("q").await.unwrap(), Some("second".to_string()));
        assert_eq!(store.pop_back("q").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_publish_is_recorded() {
        let store = MemoryStore::new();
        store.publish("task_updates", "{}").await.unwrap();

        let published = store.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, "task_updates");
    }
}
