use std::path::PathBuf;
use std::time::Duration;

pub const API_BASE: &str = "https://api.magicthegathering.io/v1";

pub const USER_AGENT: &str = concat!("mtg-catalog/", env!("CARGO_PKG_VERSION"));

/// Value sent in the `X-Ratelimit-Precision` header.
pub const RATELIMIT_PRECISION: &str = "millisecond";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Environment variable holding the bearer/bot token.
pub const TOKEN_ENV: &str = "MTG_TOKEN";
/// Environment variable overriding [`API_BASE`].
pub const API_BASE_ENV: &str = "MTG_API_BASE";

/// Path templates for the remote catalog operations. `:name` segments are
/// bound by [`Endpoint::bind`](crate::endpoint::Endpoint::bind).
pub mod endpoints {
    pub const CARDS: &str = "cards";
    pub const CARD: &str = "cards/:id";
    pub const SETS: &str = "sets";
    pub const SET: &str = "sets/:id";
    pub const SETS_BOOSTER: &str = "sets/:id/booster";
    pub const TYPES: &str = "types";
    pub const SUBTYPES: &str = "subtypes";
    pub const SUPERTYPES: &str = "supertypes";
    pub const FORMATS: &str = "formats";
}

pub fn default_cache_dir() -> PathBuf {
    if let Some(cache) = dirs::cache_dir() {
        cache.join("mtg-catalog")
    } else {
        PathBuf::from(".mtg-catalog-cache")
    }
}
