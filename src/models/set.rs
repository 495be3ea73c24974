use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::card::parse_release_date;
use super::entity::Entity;

// ---------------------------------------------------------------------------
// CardSet
// ---------------------------------------------------------------------------

/// A set (expansion) as returned by `GET /sets` and `GET /sets/:id`.
/// Identified by its `code`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardSet {
    pub code: String,
    pub name: String,
    #[serde(rename = "type")]
    pub type_field: Option<String>,
    pub block: Option<String>,
    pub border: Option<String>,
    pub expansion: Option<String>,
    pub gatherer_code: Option<String>,
    pub old_code: Option<String>,
    pub magic_cards_info_code: Option<String>,
    pub mkm_id: Option<i64>,
    pub mkm_name: Option<String>,
    pub release_date: Option<String>,
    pub online_only: Option<bool>,
    /// Booster slot layout; each slot is a rarity name or a list of alternatives.
    #[serde(default)]
    pub booster: Vec<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,

    #[serde(skip)]
    created: bool,
}

impl CardSet {
    pub fn release_date_as_date(&self) -> Option<NaiveDate> {
        self.release_date.as_deref().and_then(parse_release_date)
    }
}

impl Entity for CardSet {
    const KIND: &'static str = "set";

    fn key(&self) -> &str {
        &self.code
    }

    fn is_created(&self) -> bool {
        self.created
    }

    fn mark_created(&mut self) {
        self.created = true;
    }
}
