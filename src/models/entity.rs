use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// A catalog record with a stable identity.
///
/// Two entities with the same [`key`](Entity::key) describe the same card or
/// set; the repository keeps at most one live handle per lookup key.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Human-readable kind, used in log fields and error messages.
    const KIND: &'static str;

    /// Identity attribute (`id` for cards, `code` for sets).
    fn key(&self) -> &str;

    /// Whether the entity is known to exist remotely.
    fn is_created(&self) -> bool;

    fn mark_created(&mut self);
}

/// Merge repository-level default bindings into a raw entity payload before
/// it is decoded. Attributes the payload already carries win, whether the
/// record models them as fields or keeps them in its extra-attribute bag.
pub fn merge_defaults(payload: &mut Value, defaults: &HashMap<String, String>) {
    let Value::Object(attributes) = payload else {
        return;
    };
    for (name, value) in defaults {
        attributes
            .entry(name.clone())
            .or_insert_with(|| Value::String(value.clone()));
    }
}
