//! Glue between a chat gateway and the catalog.
//!
//! The gateway binding calls [`LookupHandler::handle`] when a user invokes a
//! lookup, and receives rendered replies through its [`MessageSink`]. Catalog
//! failures become user-facing ephemeral text; only sink failures are
//! returned to the gateway.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{CatalogError, Result};
use crate::present::{self, CardView, SymbolMap};
use crate::query::RawQuery;
use crate::MtgCatalog;

pub const DEFAULT_MAX_RESULTS: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Cards(Vec<CardView>),
    Text { content: String, ephemeral: bool },
}

/// Outbound half of a chat gateway binding.
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn send(&self, reply: Reply) -> Result<()>;
}

pub struct LookupHandler {
    catalog: Arc<MtgCatalog>,
    symbols: SymbolMap,
    max_results: usize,
    image_only: bool,
}

impl LookupHandler {
    pub fn new(catalog: Arc<MtgCatalog>, symbols: SymbolMap) -> Self {
        Self {
            catalog,
            symbols,
            max_results: DEFAULT_MAX_RESULTS,
            image_only: true,
        }
    }

    pub fn max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// Render detailed views even when a card image is available.
    pub fn image_only(mut self, image_only: bool) -> Self {
        self.image_only = image_only;
        self
    }

    /// Run a filtered search and reply with up to `max_results` cards.
    #[tracing::instrument(skip(self, filters, sink))]
    pub async fn handle(&self, filters: &RawQuery, sink: &dyn MessageSink) -> Result<()> {
        let reply = match self.catalog.cards().search(filters).await {
            Ok(cards) => {
                let views: Vec<CardView> = cards
                    .iter()
                    .filter_map(|card| present::present_card(card, &self.symbols, self.image_only))
                    .take(self.max_results)
                    .collect();
                if views.is_empty() {
                    ephemeral("No cards found.")
                } else {
                    Reply::Cards(views)
                }
            }
            Err(e) => self.failure_reply(e),
        };
        sink.send(reply).await
    }

    /// Look up a single card by id and reply with it.
    #[tracing::instrument(skip(self, sink))]
    pub async fn handle_id(&self, id: &str, sink: &dyn MessageSink) -> Result<()> {
        let reply = match self.catalog.cards().fetch(id, false).await {
            Ok(card) => match present::present_card(&card, &self.symbols, self.image_only) {
                Some(view) => Reply::Cards(vec![view]),
                None => ephemeral(format!("{} cannot be displayed.", card.name)),
            },
            Err(e) => self.failure_reply(e),
        };
        sink.send(reply).await
    }

    fn failure_reply(&self, err: CatalogError) -> Reply {
        match err.root_cause() {
            CatalogError::InvalidArgument(msg) => ephemeral(format!("Invalid query: {}", msg)),
            CatalogError::Status { status: 404, .. } => ephemeral("No cards found."),
            _ => {
                tracing::error!(error = %err, "Card lookup failed");
                ephemeral("Card lookup failed. Please try again later.")
            }
        }
    }
}

fn ephemeral(content: impl Into<String>) -> Reply {
    Reply::Text {
        content: content.into(),
        ephemeral: true,
    }
}
