use std::sync::Arc;

use crate::models::Entity;

/// Ordered list of shared entity handles, in the order the API returned them.
///
/// Holding a `Collection` keeps its entities alive, and therefore keeps them
/// answerable from a repository's live-handle tier.
#[derive(Debug, Clone)]
pub struct Collection<T> {
    items: Vec<Arc<T>>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Entity> Collection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: Arc<T>) {
        self.items.push(item);
    }

    pub fn first(&self) -> Option<&Arc<T>> {
        self.items.first()
    }

    pub fn last(&self) -> Option<&Arc<T>> {
        self.items.last()
    }

    /// Look up an item by identity.
    pub fn get(&self, key: &str) -> Option<&Arc<T>> {
        self.items.iter().find(|item| item.key() == key)
    }

    pub fn keys(&self) -> Vec<&str> {
        self.items.iter().map(|item| item.key()).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Arc<T>> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> FromIterator<Arc<T>> for Collection<T> {
    fn from_iter<I: IntoIterator<Item = Arc<T>>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<T> IntoIterator for Collection<T> {
    type Item = Arc<T>;
    type IntoIter = std::vec::IntoIter<Arc<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Collection<T> {
    type Item = &'a Arc<T>;
    type IntoIter = std::slice::Iter<'a, Arc<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
