//! Typed, cached client for the magicthegathering.io card catalog.
//!
//! Filters are validated against a closed schema, turned into concrete
//! requests, dispatched through a pluggable HTTP transport, and the decoded
//! cards and sets are cached in two tiers: weakly held live handles and an
//! injected external cache.
//!
//! # Quick start
//!
//! ```no_run
//! use mtg_catalog::MtgCatalog;
//! use serde_json::json;
//!
//! # async fn example() -> mtg_catalog::Result<()> {
//! let catalog = MtgCatalog::builder().token("secret").build()?;
//!
//! // Search by filters
//! let filters = json!({"name": "Black Lotus"});
//! let cards = catalog.cards().search(filters.as_object().unwrap()).await?;
//!
//! // Identity lookup through the cache tiers
//! let card = catalog.cards().fetch("5f8287b1-5bb6-5f4c-ad17-316a40d5bb0c", false).await?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod collection;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod lookup;
pub mod models;
pub mod present;
pub mod query;
pub mod repository;
pub mod transport;

pub use cache::{ExternalCache, FileCache, LiveHandles, MemoryCache};
pub use collection::Collection;
pub use endpoint::{Endpoint, RequestDescriptor};
pub use error::{CatalogError, Result};
pub use http::{Envelope, HttpClient};
pub use models::{Card, CardSet, Entity};
pub use repository::{CardRepository, Repository, RepositoryEndpoints, SetRepository};
pub use transport::{ReqwestTransport, Transport};

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

// ---------------------------------------------------------------------------
// MtgCatalogBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing an [`MtgCatalog`].
///
/// Use [`MtgCatalog::builder()`] to obtain a builder, chain configuration
/// methods, and call [`build()`](MtgCatalogBuilder::build).
pub struct MtgCatalogBuilder {
    token: Option<String>,
    base_url: String,
    timeout: Duration,
    user_agent: Option<String>,
    transport: Option<Arc<dyn Transport>>,
    default_transport: bool,
    external: Option<Arc<dyn ExternalCache>>,
}

impl Default for MtgCatalogBuilder {
    fn default() -> Self {
        Self {
            token: None,
            base_url: config::API_BASE.to_string(),
            timeout: config::DEFAULT_TIMEOUT,
            user_agent: None,
            transport: None,
            default_transport: true,
            external: None,
        }
    }
}

impl MtgCatalogBuilder {
    /// Start from the environment: `MTG_TOKEN` supplies the token and
    /// `MTG_API_BASE` overrides the API base URL.
    pub fn from_env() -> Self {
        let mut builder = Self::default();
        if let Ok(token) = std::env::var(config::TOKEN_ENV) {
            builder.token = Some(token);
        }
        if let Ok(base) = std::env::var(config::API_BASE_ENV) {
            builder.base_url = base;
        }
        builder
    }

    /// Token sent as `Authorization: Bot <token>`.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Request timeout for the default `reqwest` transport.
    ///
    /// Defaults to 30 seconds. Ignored when a custom transport is supplied.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Use a custom transport driver instead of [`ReqwestTransport`].
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self.default_transport = true;
        self
    }

    /// Build with no transport at all. Every request then fails with
    /// [`CatalogError::TransportUnavailable`].
    pub fn without_transport(mut self) -> Self {
        self.transport = None;
        self.default_transport = false;
        self
    }

    /// External cache shared by the card and set repositories.
    ///
    /// Defaults to a fresh [`MemoryCache`].
    pub fn external_cache(mut self, cache: Arc<dyn ExternalCache>) -> Self {
        self.external = Some(cache);
        self
    }

    pub fn build(self) -> Result<MtgCatalog> {
        let transport = match self.transport {
            Some(t) => Some(t),
            None if self.default_transport => {
                Some(Arc::new(ReqwestTransport::new(self.timeout)?) as Arc<dyn Transport>)
            }
            None => None,
        };

        let mut http = HttpClient::new(self.base_url, self.token, transport);
        if let Some(ua) = self.user_agent {
            http = http.with_user_agent(ua);
        }
        let http = Arc::new(http);

        let external = self
            .external
            .unwrap_or_else(|| Arc::new(MemoryCache::new()) as Arc<dyn ExternalCache>);

        Ok(MtgCatalog {
            cards: Repository::new(http.clone(), external.clone(), RepositoryEndpoints::CARDS),
            sets: Repository::new(http.clone(), external, RepositoryEndpoints::SETS),
            http,
        })
    }
}

// ---------------------------------------------------------------------------
// MtgCatalog
// ---------------------------------------------------------------------------

/// The main entry point: owns the shared HTTP facade and the card and set
/// repositories. Collaborators are injected through [`MtgCatalogBuilder`].
pub struct MtgCatalog {
    http: Arc<HttpClient>,
    cards: CardRepository,
    sets: SetRepository,
}

impl MtgCatalog {
    pub fn builder() -> MtgCatalogBuilder {
        MtgCatalogBuilder::default()
    }

    pub fn cards(&self) -> &CardRepository {
        &self.cards
    }

    pub fn sets(&self) -> &SetRepository {
        &self.sets
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// All card types (`GET /types`).
    pub async fn types(&self) -> Result<Vec<String>> {
        self.names(config::endpoints::TYPES, "types").await
    }

    /// All subtypes (`GET /subtypes`).
    pub async fn subtypes(&self) -> Result<Vec<String>> {
        self.names(config::endpoints::SUBTYPES, "subtypes").await
    }

    /// All supertypes (`GET /supertypes`).
    pub async fn supertypes(&self) -> Result<Vec<String>> {
        self.names(config::endpoints::SUPERTYPES, "supertypes").await
    }

    /// All game formats (`GET /formats`).
    pub async fn formats(&self) -> Result<Vec<String>> {
        self.names(config::endpoints::FORMATS, "formats").await
    }

    /// Generate a booster for `set_code` (`GET /sets/:id/booster`).
    ///
    /// The generated cards are written through the card repository's cache
    /// tiers like any other network-origin card.
    #[tracing::instrument(skip(self))]
    pub async fn booster(&self, set_code: &str) -> Result<Collection<Card>> {
        let descriptor = Endpoint::new(config::endpoints::SETS_BOOSTER)
            .bind("id", set_code)
            .build()?;
        let mut envelope = self.http.get(&descriptor).await?;
        let raw = envelope.raw().to_string();
        let values = envelope.take_array("cards")?;
        self.cards.ingest(values, &raw).await
    }

    async fn names(&self, template: &'static str, key: &str) -> Result<Vec<String>> {
        let descriptor = Endpoint::new(template).build()?;
        let mut envelope = self.http.get(&descriptor).await?;
        envelope.entities(key)
    }
}

impl fmt::Display for MtgCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MtgCatalog(base_url={}, live_cards={}, live_sets={})",
            self.http.base_url(),
            self.cards.live().live_count(),
            self.sets.live().live_count()
        )
    }
}
