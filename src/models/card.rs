use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::entity::Entity;
use super::sub::{ForeignName, Legality, Ruling};

// ---------------------------------------------------------------------------
// Card
// ---------------------------------------------------------------------------

/// A single card printing as returned by `GET /cards` and `GET /cards/:id`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    pub name: String,
    pub names: Option<Vec<String>>,
    pub mana_cost: Option<String>,
    pub cmc: Option<f64>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub color_identity: Vec<String>,
    #[serde(rename = "type")]
    pub type_field: Option<String>,
    #[serde(default)]
    pub supertypes: Vec<String>,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub subtypes: Vec<String>,
    pub rarity: Option<String>,
    pub set: Option<String>,
    pub set_name: Option<String>,
    pub text: Option<String>,
    pub flavor: Option<String>,
    pub artist: Option<String>,
    pub number: Option<String>,
    pub power: Option<String>,
    pub toughness: Option<String>,
    pub loyalty: Option<String>,
    pub language: Option<String>,
    pub game_format: Option<String>,
    pub legality: Option<String>,
    pub layout: Option<String>,
    pub multiverseid: Option<Value>,
    pub variations: Option<Vec<String>>,
    pub image_url: Option<String>,
    pub watermark: Option<String>,
    pub border: Option<String>,
    pub timeshifted: Option<bool>,
    pub hand: Option<i64>,
    pub life: Option<i64>,
    pub reserved: Option<bool>,
    pub release_date: Option<String>,
    pub starter: Option<bool>,
    #[serde(default)]
    pub rulings: Vec<Ruling>,
    #[serde(default)]
    pub foreign_names: Vec<ForeignName>,
    #[serde(default)]
    pub printings: Vec<String>,
    pub original_text: Option<String>,
    pub original_type: Option<String>,
    #[serde(default)]
    pub legalities: Vec<Legality>,
    pub source: Option<String>,

    /// Attributes not modelled above, including merged default bindings.
    #[serde(flatten)]
    pub extra: Map<String, Value>,

    #[serde(skip)]
    pub(crate) created: bool,
}

impl Card {
    /// Parse `releaseDate`. The API sends either `YYYY-MM-DD` or a bare year.
    pub fn release_date_as_date(&self) -> Option<NaiveDate> {
        self.release_date.as_deref().and_then(parse_release_date)
    }

    pub fn rulings_as_list(&self) -> &[Ruling] {
        &self.rulings
    }

    /// Legality status in `format` (case-insensitive), e.g. `"Legal"` or `"Banned"`.
    pub fn legality_in(&self, format: &str) -> Option<&str> {
        self.legalities
            .iter()
            .find(|l| l.format.eq_ignore_ascii_case(format))
            .map(|l| l.legality.as_str())
    }

    pub fn foreign_name_in(&self, language: &str) -> Option<&ForeignName> {
        self.foreign_names
            .iter()
            .find(|f| f.language.eq_ignore_ascii_case(language))
    }

    /// The printed type line. Falls back to composing it from
    /// supertypes/types/subtypes when `type` is absent.
    pub fn type_line(&self) -> String {
        if let Some(t) = &self.type_field {
            return t.clone();
        }
        let mut line = self
            .supertypes
            .iter()
            .chain(self.types.iter())
            .cloned()
            .collect::<Vec<_>>()
            .join(" ");
        if !self.subtypes.is_empty() {
            line.push_str(" - ");
            line.push_str(&self.subtypes.join(" "));
        }
        line
    }
}

impl Entity for Card {
    const KIND: &'static str = "card";

    fn key(&self) -> &str {
        &self.id
    }

    fn is_created(&self) -> bool {
        self.created
    }

    fn mark_created(&mut self) {
        self.created = true;
    }
}

pub(crate) fn parse_release_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().or_else(|| {
        raw.parse::<i32>()
            .ok()
            .and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1))
    })
}
