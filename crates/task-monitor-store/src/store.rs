use crate::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Contract for the key-value store shared with worker processes.
///
/// The monitor consumes a small slice of the store's surface: heartbeat
/// enumeration and fetch, result persistence with expiry, dead-worker key
/// deletion, queue pushes for requeued tasks, and status broadcasts. Values
/// are JSON strings end to end.
///
/// The production store is external (workers and the web layer talk to the
/// same one); [`crate::MemoryStore`] implements this trait for tests and
/// local development.
#[async_trait]
pub trait SharedStore: Send + Sync {
    /// List every key starting with `prefix`.
    async fn keys(&self, prefix: &str) -> Result<Vec<String>>;

    /// Fetch the value at `key`, `None` when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write `value` at `key`, expiring after `ttl`.
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Remove `key`. Returns `false` when the key was already gone; a
    /// missing key is never an error.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Push `value` to the front of the named queue.
    async fn push_front(&self, queue: &str, value: &str) -> Result<()>;

    /// Pop a value from the back of the named queue (consumer end).
    async fn pop_back(&self, queue: &str) -> Result<Option<String>>;

    /// Broadcast `message` on a notification channel; returns the number of
    /// receivers.
    async fn publish(&self, channel: &str, message: &str) -> Result<usize>;
}
