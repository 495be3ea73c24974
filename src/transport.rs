//! Pluggable HTTP transport drivers.
//!
//! The [`HttpClient`](crate::http::HttpClient) facade never talks to the
//! network directly; it hands a fully formed request to a [`Transport`].
//! [`ReqwestTransport`] is the production driver. Tests substitute stubs.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{CatalogError, Result};

/// A raw transport-level response.
#[derive(Debug, Clone, Default)]
pub struct Response {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(
        &self,
        method: &str,
        url: &str,
        headers: &HashMap<String, String>,
        body: Option<Vec<u8>>,
    ) -> Result<Response>;
}

/// [`Transport`] backed by an async `reqwest` client.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn request(
        &self,
        method: &str,
        url: &str,
        headers: &HashMap<String, String>,
        body: Option<Vec<u8>>,
    ) -> Result<Response> {
        let method = reqwest::Method::from_bytes(method.as_bytes())
            .map_err(|_| CatalogError::InvalidArgument(format!("Invalid HTTP method: {}", method)))?;

        let mut req = self.client.request(method, url);
        for (name, value) in headers {
            req = req.header(name.as_str(), value.as_str());
        }
        if let Some(body) = body {
            req = req.body(body);
        }

        let resp = req.send().await?;
        let status = resp.status().as_u16();
        let headers = resp
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = resp.bytes().await?.to_vec();

        Ok(Response {
            status,
            headers,
            body,
        })
    }
}
