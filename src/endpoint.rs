//! Endpoint builder: binds `:name` placeholders in a path template and
//! collects query parameters into a [`RequestDescriptor`].
//!
//! Builder methods return `&mut Self` for chaining.
//!
//! # Example
//!
//! ```rust
//! use mtg_catalog::endpoint::Endpoint;
//! use mtg_catalog::config::endpoints;
//!
//! let descriptor = Endpoint::new(endpoints::SETS_BOOSTER)
//!     .bind("id", "KTK")
//!     .build()
//!     .unwrap();
//! assert_eq!(descriptor.path, "sets/KTK/booster");
//! ```

use std::collections::HashMap;

use crate::error::{CatalogError, Result};
use crate::query::ValidatedQuery;

/// A concrete request target: final path (relative to the API base) and
/// ordered query pairs. Headers are attached by the HTTP facade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    /// Template the descriptor was built from, e.g. `cards/:id`.
    pub template: &'static str,
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl RequestDescriptor {
    /// Join the descriptor onto `base` and percent-encode the query string.
    pub fn url(&self, base: &str) -> Result<reqwest::Url> {
        let joined = format!("{}/{}", base.trim_end_matches('/'), self.path);
        let url = if self.query.is_empty() {
            reqwest::Url::parse(&joined)
        } else {
            reqwest::Url::parse_with_params(&joined, &self.query)
        };
        url.map_err(|e| CatalogError::InvalidArgument(format!("Invalid URL {}: {}", joined, e)))
    }
}

/// Builds a [`RequestDescriptor`] from a path template.
pub struct Endpoint {
    template: &'static str,
    bindings: HashMap<String, String>,
    query: Vec<(String, String)>,
}

impl Endpoint {
    pub fn new(template: &'static str) -> Self {
        Self {
            template,
            bindings: HashMap::new(),
            query: Vec::new(),
        }
    }

    /// Names of the `:name` placeholders in `template`, in path order.
    pub fn placeholders(template: &str) -> Vec<&str> {
        template
            .split('/')
            .filter_map(|segment| segment.strip_prefix(':'))
            .collect()
    }

    /// Bind a value to the `:name` placeholder.
    pub fn bind(&mut self, name: &str, value: &str) -> &mut Self {
        self.bindings.insert(name.to_string(), value.to_string());
        self
    }

    /// Bind every entry of `bindings`. Entries with no matching placeholder
    /// are ignored.
    pub fn bind_all(&mut self, bindings: &HashMap<String, String>) -> &mut Self {
        for (name, value) in bindings {
            self.bindings.insert(name.clone(), value.clone());
        }
        self
    }

    /// Add every non-null, non-empty parameter of a validated query.
    pub fn with_query(&mut self, query: &ValidatedQuery) -> &mut Self {
        for (key, value) in query.iter() {
            if let Some(param) = value.as_param() {
                self.query.push((key.to_string(), param));
            }
        }
        self
    }

    /// Substitute placeholders and produce the descriptor.
    ///
    /// Each bound value fills exactly one path segment: it is
    /// percent-encoded, so `/`, `?` and `#` cannot leave the placeholder.
    ///
    /// Fails with [`CatalogError::MissingBinding`] when a placeholder has no
    /// bound value (or is bound to an empty string), and with
    /// [`CatalogError::InvalidArgument`] for the dot segments `.` and `..`.
    pub fn build(&self) -> Result<RequestDescriptor> {
        let mut segments = Vec::new();
        for segment in self.template.split('/') {
            match segment.strip_prefix(':') {
                Some(name) => match self.bindings.get(name) {
                    Some(value) if value == "." || value == ".." => {
                        return Err(CatalogError::InvalidArgument(format!(
                            "Value '{}' is not allowed for ':{}'",
                            value, name
                        )));
                    }
                    Some(value) if !value.is_empty() => {
                        segments.push(urlencoding::encode(value).into_owned())
                    }
                    _ => return Err(CatalogError::MissingBinding(name.to_string())),
                },
                None => segments.push(segment.to_string()),
            }
        }

        Ok(RequestDescriptor {
            template: self.template,
            path: segments.join("/"),
            query: self.query.clone(),
        })
    }
}

/// One-shot form of the builder: bind `path_bindings` into `template` and
/// attach `query`.
pub fn build(
    template: &'static str,
    path_bindings: &HashMap<String, String>,
    query: Option<&ValidatedQuery>,
) -> Result<RequestDescriptor> {
    let mut endpoint = Endpoint::new(template);
    endpoint.bind_all(path_bindings);
    if let Some(q) = query {
        endpoint.with_query(q);
    }
    endpoint.build()
}
