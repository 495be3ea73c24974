//! Shared test fixtures for the catalog integration tests.
//!
//! Provides a scripted [`StubTransport`] that counts and records requests,
//! and an [`InstrumentedCache`] that records every external-cache write.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mtg_catalog::transport::{Response, Transport};
use mtg_catalog::{ExternalCache, MemoryCache, MtgCatalog, Result};
use serde_json::Value;

// ---------------------------------------------------------------------------
// StubTransport
// ---------------------------------------------------------------------------

/// Transport answering by URL path (query string ignored). Unknown paths
/// get a 404.
#[derive(Default)]
pub struct StubTransport {
    routes: Mutex<HashMap<String, (u16, String)>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub headers: HashMap<String, String>,
}

impl StubTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Answer `path` (e.g. `/v1/cards/abc`) with a 200 JSON body.
    pub fn route(&self, path: &str, body: Value) {
        self.route_raw(path, 200, &body.to_string());
    }

    pub fn route_raw(&self, path: &str, status: u16, body: &str) {
        self.routes
            .lock()
            .unwrap()
            .insert(path.to_string(), (status, body.to_string()));
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Paths of every request made so far, in order.
    pub fn paths(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| reqwest::Url::parse(&r.url).unwrap().path().to_string())
            .collect()
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn request(
        &self,
        method: &str,
        url: &str,
        headers: &HashMap<String, String>,
        _body: Option<Vec<u8>>,
    ) -> Result<Response> {
        self.requests.lock().unwrap().push(RecordedRequest {
            method: method.to_string(),
            url: url.to_string(),
            headers: headers.clone(),
        });

        let path = reqwest::Url::parse(url).unwrap().path().to_string();
        let (status, body) = self
            .routes
            .lock()
            .unwrap()
            .get(&path)
            .cloned()
            .unwrap_or((404, r#"{"error":"Not Found"}"#.to_string()));

        // Yield so concurrent callers genuinely interleave.
        tokio::task::yield_now().await;

        Ok(Response {
            status,
            headers: HashMap::new(),
            body: body.into_bytes(),
        })
    }
}

// ---------------------------------------------------------------------------
// InstrumentedCache
// ---------------------------------------------------------------------------

/// [`MemoryCache`] wrapper that records the keys of every write.
#[derive(Default)]
pub struct InstrumentedCache {
    inner: MemoryCache,
    sets: Mutex<Vec<String>>,
    batches: Mutex<Vec<Vec<String>>>,
}

impl InstrumentedCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_keys(&self) -> Vec<String> {
        self.sets.lock().unwrap().clone()
    }

    /// Sorted keys of each `set_multiple` call.
    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().unwrap().clone()
    }

    pub fn writes(&self) -> usize {
        self.sets.lock().unwrap().len() + self.batches.lock().unwrap().len()
    }

    /// Seed an entry without recording it as a write.
    pub async fn seed(&self, key: &str, value: Value) {
        self.inner.set(key, value).await.unwrap();
    }
}

#[async_trait]
impl ExternalCache for InstrumentedCache {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Value) -> Result<bool> {
        self.sets.lock().unwrap().push(key.to_string());
        self.inner.set(key, value).await
    }

    async fn set_multiple(&self, items: HashMap<String, Value>) -> Result<bool> {
        let mut keys: Vec<String> = items.keys().cloned().collect();
        keys.sort();
        self.batches.lock().unwrap().push(keys);
        self.inner.set_multiple(items).await
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Build a catalog wired to the given stubs.
pub fn catalog(transport: &Arc<StubTransport>, cache: &Arc<InstrumentedCache>) -> MtgCatalog {
    MtgCatalog::builder()
        .token("test-token")
        .transport(transport.clone())
        .external_cache(cache.clone())
        .build()
        .unwrap()
}

pub fn lotus() -> Value {
    serde_json::json!({
        "id": "abc",
        "name": "Black Lotus",
        "layout": "normal",
        "manaCost": "{0}",
        "cmc": 0,
        "colorIdentity": [],
        "type": "Artifact",
        "types": ["Artifact"],
        "rarity": "Rare",
        "set": "LEA",
        "setName": "Limited Edition Alpha",
        "text": "{T}, Sacrifice Black Lotus: Add three mana of any one color.",
        "artist": "Christopher Rush",
        "imageUrl": "http://example.test/lotus.png"
    })
}
