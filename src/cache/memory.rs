use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;

use super::ExternalCache;
use crate::error::Result;

struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// In-process [`ExternalCache`] with an optional time-to-live.
///
/// Expired entries are dropped lazily on read, or all at once by
/// [`sweep`](Self::sweep).
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
    ttl: Option<Duration>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl: Some(ttl),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn entry(&self, value: Value) -> Entry {
        Entry {
            value,
            expires_at: self.ttl.map(|ttl| Instant::now() + ttl),
        }
    }

    /// Remove expired entries. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, e| !e.is_expired(now));
        let removed = before - entries.len();
        if removed > 0 {
            tracing::info!(removed, remaining = entries.len(), "Swept expired cache entries");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

#[async_trait]
impl ExternalCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let mut entries = self.lock();
        match entries.get(key) {
            Some(e) if e.is_expired(Instant::now()) => {
                tracing::debug!(key, "Cache entry expired, removing");
                entries.remove(key);
                Ok(None)
            }
            Some(e) => Ok(Some(e.value.clone())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Value) -> Result<bool> {
        let entry = self.entry(value);
        self.lock().insert(key.to_string(), entry);
        Ok(true)
    }

    async fn set_multiple(&self, items: HashMap<String, Value>) -> Result<bool> {
        let mut entries = self.lock();
        for (key, value) in items {
            let entry = self.entry(value);
            entries.insert(key, entry);
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn set_then_get() {
        let cache = MemoryCache::new();
        assert!(cache.set("abc", json!({"id": "abc"})).await.unwrap());
        assert_eq!(cache.get("abc").await.unwrap(), Some(json!({"id": "abc"})));
        assert_eq!(cache.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn expired_entries_are_misses() {
        let cache = MemoryCache::with_ttl(Duration::ZERO);
        cache.set("abc", json!(1)).await.unwrap();
        assert_eq!(cache.get("abc").await.unwrap(), None);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn sweep_removes_expired() {
        let cache = MemoryCache::with_ttl(Duration::ZERO);
        let items = HashMap::from([("a".to_string(), json!(1)), ("b".to_string(), json!(2))]);
        cache.set_multiple(items).await.unwrap();
        assert_eq!(cache.sweep(), 2);
    }
}
