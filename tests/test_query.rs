//! Filter validation and request construction tests.

use std::collections::HashMap;

use mtg_catalog::config::{self, endpoints};
use mtg_catalog::endpoint::{self, Endpoint};
use mtg_catalog::query::{self, QueryValue, SearchCardsParams, SET_FILTERS};
use mtg_catalog::CatalogError;
use serde_json::{json, Value};

fn raw(v: Value) -> serde_json::Map<String, Value> {
    v.as_object().cloned().unwrap()
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[test]
fn language_defaults_to_english() {
    let q = query::validate(&raw(json!({"name": "Lotus"}))).unwrap();
    assert_eq!(q.get("language"), Some(&QueryValue::Text("English".into())));
    assert_eq!(q.get("name"), Some(&QueryValue::Text("Lotus".into())));
}

#[test]
fn explicit_language_wins() {
    let q = query::validate(&raw(json!({"language": "Japanese"}))).unwrap();
    assert_eq!(q.get("language"), Some(&QueryValue::Text("Japanese".into())));
}

#[test]
fn explicit_null_suppresses_default() {
    let q = query::validate(&raw(json!({"language": null}))).unwrap();
    assert_eq!(q.get("language"), Some(&QueryValue::Null));

    let descriptor = Endpoint::new(endpoints::CARDS).with_query(&q).build().unwrap();
    assert!(descriptor.query.is_empty());
}

#[test]
fn unknown_key_is_rejected() {
    let err = query::validate(&raw(json!({"flavour": "x"}))).unwrap_err();
    match err {
        CatalogError::InvalidArgument(msg) => assert!(msg.contains("\"flavour\"")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn comma_rejected_outside_multi_value_fields() {
    let err = query::validate(&raw(json!({"name": "Fire, Ice"}))).unwrap_err();
    match err {
        CatalogError::InvalidArgument(msg) => {
            assert_eq!(msg, "Field 'name' cannot contain a comma.")
        }
        other => panic!("unexpected error: {other}"),
    }

    for key in ["colors", "colorIdentity", "supertypes", "types", "subtypes"] {
        let mut filters = serde_json::Map::new();
        filters.insert(key.to_string(), json!("a,b"));
        assert!(query::validate(&filters).is_ok(), "{key} should allow commas");
    }
}

#[test]
fn pipe_is_allowed_everywhere() {
    assert!(query::validate(&raw(json!({"rarity": "Rare|Mythic"}))).is_ok());
}

#[test]
fn strict_value_types() {
    assert!(query::validate(&raw(json!({"page": 2, "pageSize": 50}))).is_ok());
    assert!(matches!(
        query::validate(&raw(json!({"page": "2"}))),
        Err(CatalogError::InvalidArgument(_))
    ));
    assert!(matches!(
        query::validate(&raw(json!({"cmc": 3}))),
        Err(CatalogError::InvalidArgument(_))
    ));
    assert!(matches!(
        query::validate(&raw(json!({"name": ["a"]}))),
        Err(CatalogError::InvalidArgument(_))
    ));
}

#[test]
fn set_schema_has_no_defaults() {
    let q = SET_FILTERS.validate(&raw(json!({"name": "Khans"}))).unwrap();
    assert_eq!(q.len(), 1);
    assert!(SET_FILTERS.validate(&raw(json!({"language": "English"}))).is_err());
}

#[test]
fn typed_params_go_through_validation() {
    let params = SearchCardsParams {
        name: Some("Goblin".into()),
        page: Some(3),
        ..Default::default()
    };
    let q = query::validate(&params.into_query()).unwrap();
    assert_eq!(q.get("page"), Some(&QueryValue::Integer(3)));
    assert_eq!(q.get("language"), Some(&QueryValue::Text("English".into())));
}

// ---------------------------------------------------------------------------
// Endpoint construction
// ---------------------------------------------------------------------------

#[test]
fn placeholders_in_path_order() {
    assert_eq!(Endpoint::placeholders(endpoints::SETS_BOOSTER), vec!["id"]);
    assert!(Endpoint::placeholders(endpoints::CARDS).is_empty());
}

#[test]
fn missing_binding_is_reported() {
    let err = Endpoint::new(endpoints::CARD).build().unwrap_err();
    assert!(matches!(err, CatalogError::MissingBinding(ref name) if name == "id"));

    let err = Endpoint::new(endpoints::CARD).bind("id", "").build().unwrap_err();
    assert!(matches!(err, CatalogError::MissingBinding(_)));
}

#[test]
fn empty_filters_are_omitted() {
    let q = query::validate(&raw(json!({"name": "", "set": "KTK"}))).unwrap();
    let descriptor = endpoint::build(endpoints::CARDS, &HashMap::new(), Some(&q)).unwrap();
    assert_eq!(
        descriptor.query,
        vec![
            ("set".to_string(), "KTK".to_string()),
            ("language".to_string(), "English".to_string()),
        ]
    );
}

#[test]
fn url_is_percent_encoded() {
    let q = query::validate(&raw(json!({"name": "Jace, the Mind Sculptor"})));
    assert!(q.is_err());

    let q = query::validate(&raw(json!({"name": "Æther Vial & Co"}))).unwrap();
    let descriptor = Endpoint::new(endpoints::CARDS).with_query(&q).build().unwrap();
    let url = descriptor.url(config::API_BASE).unwrap();
    assert_eq!(url.path(), "/v1/cards");
    let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    assert_eq!(pairs[0], ("name".to_string(), "Æther Vial & Co".to_string()));
}

#[test]
fn single_get_url() {
    let descriptor = Endpoint::new(endpoints::CARD).bind("id", "abc").build().unwrap();
    assert_eq!(descriptor.template, "cards/:id");
    assert_eq!(
        descriptor.url(config::API_BASE).unwrap().as_str(),
        "https://api.magicthegathering.io/v1/cards/abc"
    );
}

#[test]
fn bound_values_fill_a_single_segment() {
    let descriptor = Endpoint::new(endpoints::CARD)
        .bind("id", "../sets/KTK")
        .build()
        .unwrap();
    assert_eq!(descriptor.path, "cards/..%2Fsets%2FKTK");
    let url = descriptor.url(config::API_BASE).unwrap();
    assert_eq!(url.path(), "/v1/cards/..%2Fsets%2FKTK");

    let descriptor = Endpoint::new(endpoints::CARD)
        .bind("id", "abc?name=x#frag")
        .build()
        .unwrap();
    let url = descriptor.url(config::API_BASE).unwrap();
    assert_eq!(url.path(), "/v1/cards/abc%3Fname%3Dx%23frag");
    assert_eq!(url.query(), None);
    assert_eq!(url.fragment(), None);
}

#[test]
fn dot_segments_are_rejected() {
    for id in [".", ".."] {
        let err = Endpoint::new(endpoints::CARD).bind("id", id).build().unwrap_err();
        assert!(matches!(err, CatalogError::InvalidArgument(_)), "{id}");
    }
}
