//! Filter validation for list endpoints.
//!
//! Every list request goes through a closed [`FilterSchema`] before any
//! network call: unknown keys, wrongly typed values and stray commas are all
//! rejected with [`CatalogError::InvalidArgument`].
//!
//! # Example
//!
//! ```rust
//! use mtg_catalog::query::{self, QueryValue};
//! use serde_json::json;
//!
//! let raw = json!({"name": "Black Lotus", "colors": "W,U"});
//! let q = query::validate(raw.as_object().unwrap()).unwrap();
//! assert_eq!(q.get("language"), Some(&QueryValue::Text("English".into())));
//! ```

use serde_json::{Map, Value};

use crate::error::{CatalogError, Result};

/// Loosely-typed filter input, as it arrives from a command invocation.
pub type RawQuery = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    Text,
    Integer,
}

/// A closed set of filters accepted by one list endpoint.
#[derive(Debug, Clone, Copy)]
pub struct FilterSchema {
    fields: &'static [(&'static str, FilterType)],
    /// Fields that may hold comma (AND) or pipe (OR) separated values.
    multi_value: &'static [&'static str],
    defaults: &'static [(&'static str, &'static str)],
}

pub const CARD_FILTERS: FilterSchema = FilterSchema {
    fields: &[
        ("name", FilterType::Text),
        ("layout", FilterType::Text),
        ("cmc", FilterType::Text),
        ("colors", FilterType::Text),
        ("colorIdentity", FilterType::Text),
        ("type", FilterType::Text),
        ("supertypes", FilterType::Text),
        ("types", FilterType::Text),
        ("subtypes", FilterType::Text),
        ("rarity", FilterType::Text),
        ("set", FilterType::Text),
        ("setName", FilterType::Text),
        ("text", FilterType::Text),
        ("flavor", FilterType::Text),
        ("artist", FilterType::Text),
        ("number", FilterType::Text),
        ("power", FilterType::Text),
        ("toughness", FilterType::Text),
        ("loyalty", FilterType::Text),
        ("language", FilterType::Text),
        ("gameFormat", FilterType::Text),
        ("legality", FilterType::Text),
        ("page", FilterType::Integer),
        ("pageSize", FilterType::Integer),
        ("orderBy", FilterType::Text),
        ("random", FilterType::Text),
        ("contains", FilterType::Text),
        ("id", FilterType::Text),
        ("multiverseid", FilterType::Text),
    ],
    multi_value: &["colors", "colorIdentity", "supertypes", "types", "subtypes"],
    defaults: &[("language", "English")],
};

pub const SET_FILTERS: FilterSchema = FilterSchema {
    fields: &[
        ("name", FilterType::Text),
        ("block", FilterType::Text),
        ("page", FilterType::Integer),
        ("pageSize", FilterType::Integer),
    ],
    multi_value: &[],
    defaults: &[],
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    Text(String),
    Integer(i64),
    /// Explicitly unset; kept so the caller's intent survives validation,
    /// but never emitted into a query string.
    Null,
}

impl QueryValue {
    /// Render the value as a query-string parameter, or `None` when the
    /// filter should be omitted (null or empty string).
    pub fn as_param(&self) -> Option<String> {
        match self {
            QueryValue::Text(s) if s.is_empty() => None,
            QueryValue::Text(s) => Some(s.clone()),
            QueryValue::Integer(n) => Some(n.to_string()),
            QueryValue::Null => None,
        }
    }
}

/// A query that passed [`FilterSchema::validate`]. Parameters are kept in
/// schema order so request URLs are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidatedQuery {
    params: Vec<(String, QueryValue)>,
}

impl ValidatedQuery {
    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.params.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryValue)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

impl FilterSchema {
    pub fn is_known(&self, key: &str) -> bool {
        self.field_type(key).is_some()
    }

    pub fn field_type(&self, key: &str) -> Option<FilterType> {
        self.fields.iter().find(|(k, _)| *k == key).map(|(_, t)| *t)
    }

    pub fn allows_multi_value(&self, key: &str) -> bool {
        self.multi_value.contains(&key)
    }

    /// Validate and normalize `raw` against this schema. Pure; performs no I/O.
    pub fn validate(&self, raw: &RawQuery) -> Result<ValidatedQuery> {
        if let Some(unknown) = raw.keys().find(|k| !self.is_known(k)) {
            let mut known: Vec<&str> = self.fields.iter().map(|(k, _)| *k).collect();
            known.sort_unstable();
            return Err(CatalogError::InvalidArgument(format!(
                "The option \"{}\" does not exist. Defined options are: \"{}\"",
                unknown,
                known.join("\", \"")
            )));
        }

        let mut params = Vec::with_capacity(raw.len() + self.defaults.len());
        for (key, ty) in self.fields {
            let value = match raw.get(*key) {
                Some(v) => self.check(key, *ty, v)?,
                None => match self.defaults.iter().find(|(k, _)| k == key) {
                    Some((_, default)) => QueryValue::Text((*default).to_string()),
                    None => continue,
                },
            };
            params.push(((*key).to_string(), value));
        }

        Ok(ValidatedQuery { params })
    }

    fn check(&self, key: &str, ty: FilterType, value: &Value) -> Result<QueryValue> {
        let checked = match (ty, value) {
            (_, Value::Null) => QueryValue::Null,
            (FilterType::Text, Value::String(s)) => QueryValue::Text(s.clone()),
            (FilterType::Integer, Value::Number(n)) if n.is_i64() => {
                QueryValue::Integer(n.as_i64().unwrap_or_default())
            }
            (ty, other) => {
                let expected = match ty {
                    FilterType::Text => "string",
                    FilterType::Integer => "int",
                };
                return Err(CatalogError::InvalidArgument(format!(
                    "The option \"{}\" with value {} is expected to be of type \"{}\"",
                    key, other, expected
                )));
            }
        };

        if let QueryValue::Text(s) = &checked {
            if s.contains(',') && !self.allows_multi_value(key) {
                return Err(CatalogError::InvalidArgument(format!(
                    "Field '{}' cannot contain a comma.",
                    key
                )));
            }
        }

        Ok(checked)
    }
}

/// Validate card filters. Shorthand for `CARD_FILTERS.validate(raw)`.
pub fn validate(raw: &RawQuery) -> Result<ValidatedQuery> {
    CARD_FILTERS.validate(raw)
}

// ---------------------------------------------------------------------------
// SearchCardsParams
// ---------------------------------------------------------------------------

/// Strongly-typed card search parameters.
///
/// All fields are optional. Converted into a [`RawQuery`] with
/// [`into_query`](Self::into_query) so it goes through the same validation
/// as free-form input.
#[derive(Debug, Clone, Default)]
pub struct SearchCardsParams {
    pub name: Option<String>,
    pub layout: Option<String>,
    pub cmc: Option<String>,
    pub colors: Option<String>,
    pub color_identity: Option<String>,
    pub type_line: Option<String>,
    pub supertypes: Option<String>,
    pub types: Option<String>,
    pub subtypes: Option<String>,
    pub rarity: Option<String>,
    pub set: Option<String>,
    pub set_name: Option<String>,
    pub text: Option<String>,
    pub artist: Option<String>,
    pub language: Option<String>,
    pub game_format: Option<String>,
    pub legality: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub order_by: Option<String>,
    pub random: Option<bool>,
}

impl SearchCardsParams {
    pub fn into_query(self) -> RawQuery {
        let mut raw = RawQuery::new();
        let text_fields = [
            ("name", self.name),
            ("layout", self.layout),
            ("cmc", self.cmc),
            ("colors", self.colors),
            ("colorIdentity", self.color_identity),
            ("type", self.type_line),
            ("supertypes", self.supertypes),
            ("types", self.types),
            ("subtypes", self.subtypes),
            ("rarity", self.rarity),
            ("set", self.set),
            ("setName", self.set_name),
            ("text", self.text),
            ("artist", self.artist),
            ("language", self.language),
            ("gameFormat", self.game_format),
            ("legality", self.legality),
            ("orderBy", self.order_by),
            ("random", self.random.map(|r| r.to_string())),
        ];
        for (key, value) in text_fields {
            if let Some(v) = value {
                raw.insert(key.to_string(), Value::String(v));
            }
        }
        if let Some(page) = self.page {
            raw.insert("page".to_string(), Value::from(page));
        }
        if let Some(size) = self.page_size {
            raw.insert("pageSize".to_string(), Value::from(size));
        }
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(v: Value) -> RawQuery {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn explicit_language_is_kept() {
        let q = validate(&raw(json!({"language": "German"}))).unwrap();
        assert_eq!(q.get("language"), Some(&QueryValue::Text("German".into())));
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn explicit_null_language_suppresses_default() {
        let q = validate(&raw(json!({"language": null}))).unwrap();
        assert_eq!(q.get("language"), Some(&QueryValue::Null));
    }

    #[test]
    fn pipe_is_allowed_everywhere() {
        assert!(validate(&raw(json!({"rarity": "Rare|Mythic Rare"}))).is_ok());
    }

    #[test]
    fn integer_rejects_float() {
        let err = validate(&raw(json!({"pageSize": 2.5}))).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidArgument(_)));
    }

    #[test]
    fn params_are_in_schema_order() {
        let q = validate(&raw(json!({"pageSize": 5, "name": "Bolt"}))).unwrap();
        let keys: Vec<&str> = q.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["name", "language", "pageSize"]);
    }

    #[test]
    fn empty_text_renders_no_param() {
        assert_eq!(QueryValue::Text(String::new()).as_param(), None);
        assert_eq!(QueryValue::Integer(3).as_param(), Some("3".into()));
    }

    #[test]
    fn typed_params_round_into_raw_query() {
        let params = SearchCardsParams {
            type_line: Some("Creature".into()),
            page_size: Some(10),
            random: Some(true),
            ..Default::default()
        };
        let q = validate(&params.into_query()).unwrap();
        assert_eq!(q.get("type"), Some(&QueryValue::Text("Creature".into())));
        assert_eq!(q.get("pageSize"), Some(&QueryValue::Integer(10)));
        assert_eq!(q.get("random"), Some(&QueryValue::Text("true".into())));
    }
}
