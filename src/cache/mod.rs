//! The two cache tiers consulted by repositories.
//!
//! - [`LiveHandles`]: in-process map of weakly held entity handles. An entry
//!   only answers while some caller still owns the entity.
//! - [`ExternalCache`]: pluggable key/value store shared across processes
//!   ([`MemoryCache`], [`FileCache`], or anything implementing the trait).

pub mod file;
pub mod live;
pub mod memory;

pub use file::FileCache;
pub use live::LiveHandles;
pub use memory::MemoryCache;

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// Asynchronous key/value cache. Expiry is the backend's own business;
/// repositories only ever write through.
#[async_trait]
pub trait ExternalCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Store `value` under `key`. Returns whether the write was accepted.
    async fn set(&self, key: &str, value: Value) -> Result<bool>;

    /// Store every entry in one batch.
    async fn set_multiple(&self, items: HashMap<String, Value>) -> Result<bool>;
}
