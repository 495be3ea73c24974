//! HTTP client facade: attaches the standard headers, dispatches through the
//! configured [`Transport`] and decodes the JSON envelope.
//!
//! The facade never retries. Retry and backoff are a decoration the caller
//! applies around repository operations.

use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::config;
use crate::endpoint::RequestDescriptor;
use crate::error::{CatalogError, Result};
use crate::transport::Transport;

/// Top-level JSON object returned by the catalog API. The payload lives
/// under an operation-specific key (`cards`, `card`, `sets`, `set`, ...).
#[derive(Debug, Clone)]
pub struct Envelope {
    body: Map<String, Value>,
    raw: String,
}

impl Envelope {
    /// Parse a response body. Fails with [`CatalogError::MalformedResponse`]
    /// unless the body is a JSON object.
    pub fn parse(raw: &str) -> Result<Self> {
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(body)) => Ok(Self {
                body,
                raw: raw.to_string(),
            }),
            Ok(_) => Err(CatalogError::malformed("expected a JSON object", raw)),
            Err(e) => Err(CatalogError::malformed(format!("invalid JSON: {}", e), raw)),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.body.contains_key(key)
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Remove and return the payload under `key`.
    pub fn take(&mut self, key: &str) -> Result<Value> {
        self.body.remove(key).ok_or_else(|| {
            CatalogError::malformed(format!("missing top-level key '{}'", key), self.raw.as_str())
        })
    }

    /// Remove the array under `key` and return its elements.
    pub fn take_array(&mut self, key: &str) -> Result<Vec<Value>> {
        match self.take(key)? {
            Value::Array(items) => Ok(items),
            _ => Err(CatalogError::malformed(
                format!("top-level key '{}' is not an array", key),
                self.raw.as_str(),
            )),
        }
    }

    /// Decode the object under `key` into `T`.
    pub fn entity<T: DeserializeOwned>(&mut self, key: &str) -> Result<T> {
        let value = self.take(key)?;
        serde_json::from_value(value).map_err(|e| {
            CatalogError::malformed(format!("cannot decode '{}': {}", key, e), self.raw.as_str())
        })
    }

    /// Decode the array under `key` into a `Vec<T>`, preserving order.
    pub fn entities<T: DeserializeOwned>(&mut self, key: &str) -> Result<Vec<T>> {
        let items = self.take_array(key)?;
        items
            .into_iter()
            .map(|item| {
                serde_json::from_value(item).map_err(|e| {
                    CatalogError::malformed(
                        format!("cannot decode element of '{}': {}", key, e),
                        self.raw.as_str(),
                    )
                })
            })
            .collect()
    }
}

/// Issues catalog API requests through an injected [`Transport`].
pub struct HttpClient {
    base_url: String,
    token: Option<String>,
    user_agent: String,
    transport: Option<Arc<dyn Transport>>,
}

impl HttpClient {
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        transport: Option<Arc<dyn Transport>>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            token,
            user_agent: config::USER_AGENT.to_string(),
            transport,
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Standard headers attached to every request.
    pub fn headers(&self) -> HashMap<String, String> {
        let mut headers = HashMap::from([
            ("User-Agent".to_string(), self.user_agent.clone()),
            (
                "X-Ratelimit-Precision".to_string(),
                config::RATELIMIT_PRECISION.to_string(),
            ),
        ]);
        if let Some(token) = &self.token {
            headers.insert("Authorization".to_string(), format!("Bot {}", token));
        }
        headers
    }

    pub async fn get(&self, descriptor: &RequestDescriptor) -> Result<Envelope> {
        self.send("GET", descriptor, None).await
    }

    pub async fn post(&self, descriptor: &RequestDescriptor, body: &Value) -> Result<Envelope> {
        let bytes = serde_json::to_vec(body)?;
        self.send("POST", descriptor, Some(bytes)).await
    }

    async fn send(
        &self,
        method: &str,
        descriptor: &RequestDescriptor,
        body: Option<Vec<u8>>,
    ) -> Result<Envelope> {
        let transport = self
            .transport
            .as_ref()
            .ok_or(CatalogError::TransportUnavailable)?;

        let url = descriptor.url(&self.base_url)?;
        let mut headers = self.headers();
        if body.is_some() {
            headers.insert("Content-Type".to_string(), "application/json".to_string());
        }

        tracing::debug!(method, url = %url, "Sending catalog request");
        let response = transport
            .request(method, url.as_str(), &headers, body)
            .await?;

        let text = response.text();
        if !response.is_success() {
            tracing::warn!(status = response.status, url = %url, "Catalog request failed");
            return Err(CatalogError::Status {
                status: response.status,
                body: text,
            });
        }

        tracing::debug!(status = response.status, bytes = response.body.len(), "Catalog response received");
        Envelope::parse(&text)
    }
}
