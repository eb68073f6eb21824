//! Collection endpoint configuration.
//!
//! Native callers read `BEACON_ENDPOINT_URL` at runtime (or take it from the
//! CLI); WASM builds bake it in at compile time the same way.

use beacon_common::DeliveryLimits;
use thiserror::Error;
use url::Url;

/// Environment variable naming the collection endpoint.
pub const ENDPOINT_ENV: &str = "BEACON_ENDPOINT_URL";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no collection endpoint configured (set BEACON_ENDPOINT_URL)")]
    MissingEndpoint,
    #[error("invalid endpoint URL {url:?}: {reason}")]
    InvalidEndpoint { url: String, reason: String },
}

/// Where and how feedback is delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryConfig {
    endpoint: String,
    limits: DeliveryLimits,
}

impl DeliveryConfig {
    /// Validate `endpoint` as an absolute http(s) URL with no query or fragment,
    /// since strategies append `?data=` to it verbatim.
    pub fn new(endpoint: &str) -> Result<Self, ConfigError> {
        let endpoint = endpoint.trim();
        if endpoint.is_empty() {
            return Err(ConfigError::MissingEndpoint);
        }
        let invalid = |reason: &str| ConfigError::InvalidEndpoint {
            url: endpoint.to_string(),
            reason: reason.to_string(),
        };
        let parsed = Url::parse(endpoint).map_err(|e| invalid(&e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https"));
        }
        if parsed.query().is_some() {
            return Err(invalid("endpoint must not carry a query string"));
        }
        if parsed.fragment().is_some() {
            return Err(invalid("endpoint must not carry a fragment"));
        }
        Ok(Self {
            endpoint: endpoint.to_string(),
            limits: DeliveryLimits::default(),
        })
    }

    /// Read the endpoint from [`ENDPOINT_ENV`].
    pub fn from_env() -> Result<Self, ConfigError> {
        match endpoint_from_env() {
            Some(url) => Self::new(&url),
            None => Err(ConfigError::MissingEndpoint),
        }
    }

    pub fn with_limits(mut self, limits: DeliveryLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn limits(&self) -> DeliveryLimits {
        self.limits
    }
}

#[cfg(not(target_family = "wasm"))]
fn endpoint_from_env() -> Option<String> {
    std::env::var(ENDPOINT_ENV).ok().filter(|s| !s.is_empty())
}

#[cfg(target_family = "wasm")]
fn endpoint_from_env() -> Option<String> {
    option_env!("BEACON_ENDPOINT_URL")
        .filter(|s| !s.is_empty())
        .map(String::from)
}
