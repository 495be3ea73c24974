use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Ruling
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Ruling {
    pub date: String,
    pub text: String,
}

// ---------------------------------------------------------------------------
// ForeignName
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ForeignName {
    pub name: String,
    pub language: String,
    pub text: Option<String>,
    #[serde(rename = "type")]
    pub type_field: Option<String>,
    pub flavor: Option<String>,
    pub image_url: Option<String>,
    pub multiverseid: Option<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Legality
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Legality {
    pub format: String,
    pub legality: String,
}

impl Legality {
    pub fn is_legal(&self) -> bool {
        self.legality.eq_ignore_ascii_case("legal")
    }
}
