//! Card and set repositories.
//!
//! A [`Repository`] turns loosely-typed filters into validated requests and
//! resolves identity lookups through three tiers, in order:
//!
//! 1. **CheckLive**: the in-process [`LiveHandles`] map (O(1), no I/O).
//! 2. **CheckExternal**: the injected [`ExternalCache`].
//! 3. **FetchNetwork**: the catalog API's single-get endpoint.
//!
//! Every entity that arrives from the network is written to both tiers
//! before it is handed to the caller. Nothing is ever evicted here; expiry is
//! left to the external cache backend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use serde_json::Value;

use crate::cache::{ExternalCache, LiveHandles};
use crate::collection::Collection;
use crate::config::endpoints;
use crate::endpoint::{Endpoint, RequestDescriptor};
use crate::error::{CatalogError, Result};
use crate::http::HttpClient;
use crate::models::{merge_defaults, Card, CardSet, Entity};
use crate::query::{FilterSchema, RawQuery, CARD_FILTERS, SET_FILTERS};

pub type CardRepository = Repository<Card>;
pub type SetRepository = Repository<CardSet>;

// ---------------------------------------------------------------------------
// RepositoryEndpoints
// ---------------------------------------------------------------------------

/// Remote operations and envelope keys backing a repository.
#[derive(Debug, Clone, Copy)]
pub struct RepositoryEndpoints {
    /// List template, e.g. `cards`.
    pub all: Option<&'static str>,
    /// Single-get template with an `:id` placeholder, e.g. `cards/:id`.
    pub get: Option<&'static str>,
    /// Envelope key wrapping list responses.
    pub list_key: &'static str,
    /// Envelope key wrapping single-get responses.
    pub item_key: &'static str,
    pub schema: FilterSchema,
}

impl RepositoryEndpoints {
    pub const CARDS: Self = Self {
        all: Some(endpoints::CARDS),
        get: Some(endpoints::CARD),
        list_key: "cards",
        item_key: "card",
        schema: CARD_FILTERS,
    };

    pub const SETS: Self = Self {
        all: Some(endpoints::SETS),
        get: Some(endpoints::SET),
        list_key: "sets",
        item_key: "set",
        schema: SET_FILTERS,
    };

    /// Same operations with the single-get endpoint removed.
    pub const fn list_only(self) -> Self {
        Self { get: None, ..self }
    }
}

// ---------------------------------------------------------------------------
// Repository
// ---------------------------------------------------------------------------

/// Typed, cached access to one kind of catalog entity.
pub struct Repository<T: Entity> {
    http: Arc<HttpClient>,
    external: Arc<dyn ExternalCache>,
    endpoints: RepositoryEndpoints,
    bindings: HashMap<String, String>,
    live: LiveHandles<T>,
    /// Entities from the latest [`freshen`](Self::freshen), held strongly.
    items: Mutex<Collection<T>>,
    /// Per-id gates coalescing concurrent cold fetches.
    gates: Mutex<HashMap<String, Weak<tokio::sync::Mutex<()>>>>,
}

impl<T: Entity> Repository<T> {
    pub fn new(
        http: Arc<HttpClient>,
        external: Arc<dyn ExternalCache>,
        endpoints: RepositoryEndpoints,
    ) -> Self {
        Self {
            http,
            external,
            endpoints,
            bindings: HashMap::new(),
            live: LiveHandles::new(),
            items: Mutex::new(Collection::new()),
            gates: Mutex::new(HashMap::new()),
        }
    }

    /// Default bindings: substituted into endpoint placeholders and merged
    /// into the attributes of every entity this repository constructs.
    pub fn with_bindings(mut self, bindings: HashMap<String, String>) -> Self {
        self.bindings = bindings;
        self
    }

    pub fn endpoints(&self) -> &RepositoryEndpoints {
        &self.endpoints
    }

    pub fn live(&self) -> &LiveHandles<T> {
        &self.live
    }

    // -- search ------------------------------------------------------------

    /// Query the list endpoint with `filters`.
    ///
    /// Filters are validated before any I/O. Results keep the order the API
    /// returned them in, and every result is written through both cache
    /// tiers exactly as a direct fetch would.
    #[tracing::instrument(skip(self, filters), fields(kind = T::KIND))]
    pub async fn search(&self, filters: &RawQuery) -> Result<Collection<T>> {
        let query = self.endpoints.schema.validate(filters)?;
        let template = self.list_template()?;

        let descriptor = Endpoint::new(template)
            .bind_all(&self.bindings)
            .with_query(&query)
            .build()?;

        let mut envelope = self.http.get(&descriptor).await?;
        let raw = envelope.raw().to_string();
        let values = envelope.take_array(self.endpoints.list_key)?;
        tracing::debug!(results = values.len(), "Search returned");

        self.ingest(values, &raw).await
    }

    /// Construct entities from raw list elements and write each through both
    /// tiers. Used for every network-origin list payload.
    /// Nothing is stored unless every element decodes.
    pub(crate) async fn ingest(&self, values: Vec<Value>, raw: &str) -> Result<Collection<T>> {
        let entities = values
            .into_iter()
            .map(|value| self.materialize(value, raw))
            .collect::<Result<Vec<T>>>()?;

        let mut result = Collection::new();
        for entity in entities {
            result.push(self.store(entity).await?);
        }
        Ok(result)
    }

    // -- fetch -------------------------------------------------------------

    /// Resolve the entity with identity `id`.
    ///
    /// With `fresh == false` the live tier is consulted first, then the
    /// external tier, then the network. With `fresh == true` both tiers are
    /// skipped and the cached value is replaced by the network result.
    ///
    /// Network-phase failures are wrapped in [`CatalogError::FetchFailed`]
    /// and leave both tiers untouched.
    #[tracing::instrument(skip(self), fields(kind = T::KIND))]
    pub async fn fetch(&self, id: &str, fresh: bool) -> Result<Arc<T>> {
        if !fresh {
            if let Some(hit) = self.check_live(id) {
                return Ok(hit);
            }

            let gate = self.gate(id);
            let _turn = gate.lock().await;

            // A concurrent fetch of the same id may have resolved while we waited.
            if let Some(hit) = self.check_live(id) {
                return Ok(hit);
            }
            if let Some(hit) = self.check_external(id).await {
                return Ok(hit);
            }
            return self.fetch_network(id).await;
        }

        self.fetch_network(id).await
    }

    /// Synchronous live-tier lookup; never touches the external cache.
    pub fn get(&self, id: &str) -> Option<Arc<T>> {
        self.live.get(id)
    }

    fn check_live(&self, id: &str) -> Option<Arc<T>> {
        let hit = self.live.get(id);
        tracing::debug!(state = "CheckLive", hit = hit.is_some());
        hit
    }

    /// External-tier hits are returned as-is and not promoted into the live
    /// tier. Backend errors and undecodable entries count as misses.
    async fn check_external(&self, id: &str) -> Option<Arc<T>> {
        let value = match self.external.get(id).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(state = "CheckExternal", error = %e, "External cache read failed");
                None
            }
        };
        tracing::debug!(state = "CheckExternal", hit = value.is_some());

        let mut entity: T = match serde_json::from_value(value?) {
            Ok(entity) => entity,
            Err(e) => {
                tracing::warn!(state = "CheckExternal", error = %e, "Undecodable external cache entry");
                return None;
            }
        };
        entity.mark_created();
        Some(Arc::new(entity))
    }

    async fn fetch_network(&self, id: &str) -> Result<Arc<T>> {
        let template = self.endpoints.get.ok_or_else(|| {
            CatalogError::UnsupportedOperation(format!(
                "{} repository has no single-fetch endpoint",
                T::KIND
            ))
        })?;
        tracing::debug!(state = "FetchNetwork", template);

        let descriptor = Endpoint::new(template)
            .bind_all(&self.bindings)
            .bind("id", id)
            .build()?;

        let entity = self
            .request_entity(&descriptor)
            .await
            .map_err(|e| CatalogError::FetchFailed(Box::new(e)))?;

        let handle = self.store(entity).await?;
        if handle.key() != id {
            self.store_alias(id, &handle).await?;
        }
        Ok(handle)
    }

    async fn request_entity(&self, descriptor: &RequestDescriptor) -> Result<T> {
        let mut envelope = self.http.get(descriptor).await?;
        let raw = envelope.raw().to_string();
        let value = envelope.take(self.endpoints.item_key)?;
        self.materialize(value, &raw)
    }

    // -- freshen -----------------------------------------------------------

    /// Re-fetch the full list and write it to the external tier in a single
    /// [`set_multiple`](ExternalCache::set_multiple) call. The refreshed
    /// entities are held by the repository until the next freshen and are
    /// reachable through [`first`](Self::first) and [`items`](Self::items).
    #[tracing::instrument(skip(self), fields(kind = T::KIND))]
    pub async fn freshen(&self) -> Result<&Self> {
        let template = self.list_template()?;
        let descriptor = Endpoint::new(template).bind_all(&self.bindings).build()?;

        let mut envelope = self.http.get(&descriptor).await?;
        let raw = envelope.raw().to_string();
        let values = envelope.take_array(self.endpoints.list_key)?;

        let mut fresh = Collection::new();
        let mut batch = HashMap::with_capacity(values.len());
        for value in values {
            let entity = self.materialize(value, &raw)?;
            batch.insert(entity.key().to_string(), serde_json::to_value(&entity)?);
            let handle = Arc::new(entity);
            self.live.insert(&handle);
            fresh.push(handle);
        }

        let count = batch.len();
        match self.external.set_multiple(batch).await {
            Ok(true) => tracing::debug!(count, "Freshened"),
            Ok(false) => tracing::warn!(count, "External cache rejected batch write"),
            Err(e) => tracing::warn!(count, error = %e, "External cache batch write failed"),
        }

        *self.items.lock().unwrap_or_else(PoisonError::into_inner) = fresh;
        Ok(self)
    }

    /// First entity of the latest freshen.
    pub fn first(&self) -> Option<Arc<T>> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .first()
            .cloned()
    }

    /// Snapshot of the latest freshen.
    pub fn items(&self) -> Collection<T> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    // -- helpers -----------------------------------------------------------

    fn list_template(&self) -> Result<&'static str> {
        self.endpoints.all.ok_or_else(|| {
            CatalogError::UnsupportedOperation(format!("{} repository has no list endpoint", T::KIND))
        })
    }

    /// Decode one payload element into a created entity with the default
    /// bindings merged in.
    fn materialize(&self, mut value: Value, raw: &str) -> Result<T> {
        merge_defaults(&mut value, &self.bindings);
        let mut entity: T = serde_json::from_value(value).map_err(|e| {
            CatalogError::malformed(format!("cannot decode {}: {}", T::KIND, e), raw)
        })?;
        entity.mark_created();
        Ok(entity)
    }

    /// Write `entity` through the live and external tiers, then return its handle.
    async fn store(&self, entity: T) -> Result<Arc<T>> {
        let value = serde_json::to_value(&entity)?;
        let handle = Arc::new(entity);
        self.live.insert(&handle);

        let key = handle.key();
        match self.external.set(key, value).await {
            Ok(true) => {}
            Ok(false) => tracing::warn!(key, "External cache rejected write"),
            Err(e) => tracing::warn!(key, error = %e, "External cache write failed"),
        }
        Ok(handle)
    }

    /// Make `handle` answer lookups by `alias` too, in both tiers. Used when
    /// the API resolves a requested id (a multiverse id, a set code in
    /// another case) to an entity with a different identity.
    async fn store_alias(&self, alias: &str, handle: &Arc<T>) -> Result<()> {
        self.live.insert_alias(alias, handle);

        let value = serde_json::to_value(handle.as_ref())?;
        match self.external.set(alias, value).await {
            Ok(true) => tracing::debug!(alias, key = handle.key(), "Stored alias"),
            Ok(false) => tracing::warn!(alias, "External cache rejected alias write"),
            Err(e) => tracing::warn!(alias, error = %e, "External cache alias write failed"),
        }
        Ok(())
    }

    fn gate(&self, id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut gates = self.gates.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(gate) = gates.get(id).and_then(Weak::upgrade) {
            return gate;
        }
        gates.retain(|_, g| g.strong_count() > 0);
        let gate = Arc::new(tokio::sync::Mutex::new(()));
        gates.insert(id.to_string(), Arc::downgrade(&gate));
        gate
    }
}
