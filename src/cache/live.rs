use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::models::Entity;

/// Weakly held entity handles keyed by identity.
///
/// The map never keeps an entity alive. Once every owner drops its `Arc`,
/// the entry is dead and is removed on the next lookup of that key. The lock
/// is only taken for synchronous map operations, never across an `.await`.
pub struct LiveHandles<T> {
    handles: Mutex<HashMap<String, Weak<T>>>,
}

impl<T> Default for LiveHandles<T> {
    fn default() -> Self {
        Self {
            handles: Mutex::new(HashMap::new()),
        }
    }
}

impl<T: Entity> LiveHandles<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Weak<T>>> {
        self.handles.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the live handle for `key`, dropping the entry if it is dead.
    pub fn get(&self, key: &str) -> Option<Arc<T>> {
        let mut handles = self.lock();
        match handles.get(key).map(Weak::upgrade) {
            Some(Some(entity)) => Some(entity),
            Some(None) => {
                handles.remove(key);
                tracing::trace!(kind = T::KIND, key, "Dropped dead live handle");
                None
            }
            None => None,
        }
    }

    /// Register `entity`, replacing any previous handle for its key.
    pub fn insert(&self, entity: &Arc<T>) {
        self.lock()
            .insert(entity.key().to_string(), Arc::downgrade(entity));
    }

    /// Register `entity` under an additional lookup key, e.g. the id a
    /// caller fetched it by when the API answered with a different identity.
    pub fn insert_alias(&self, alias: &str, entity: &Arc<T>) {
        self.lock().insert(alias.to_string(), Arc::downgrade(entity));
    }

    pub fn remove(&self, key: &str) -> bool {
        self.lock().remove(key).is_some()
    }

    /// Number of entries whose entity is still owned somewhere.
    pub fn live_count(&self) -> usize {
        self.lock().values().filter(|w| w.strong_count() > 0).count()
    }

    /// Number of map entries, dead ones included.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Remove every dead entry. Returns how many were removed.
    pub fn prune(&self) -> usize {
        let mut handles = self.lock();
        let before = handles.len();
        handles.retain(|_, w| w.strong_count() > 0);
        before - handles.len()
    }
}
