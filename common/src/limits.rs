//! Size thresholds and query-string construction shared by every strategy.
//!
//! The two limits bound request size against real browser and proxy limits
//! on URL length. They are contractual values: callers pass them around in
//! [`DeliveryLimits`] so they are never buried as literals in the ladder.

use serde::{Deserialize, Serialize};

/// Longest encoded query URL (in characters) that the GET strategy will send.
pub const MAX_QUERY_URL_LEN: usize = 2000;

/// Number of leading characters of `feedback` and `url` kept in a pixel request.
pub const PIXEL_FIELD_CHARS: usize = 100;

/// Query parameter carrying the URL-encoded JSON document.
pub const DATA_PARAM: &str = "data";

/// Request-size limits applied by the fallback ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryLimits {
    /// Query URLs strictly longer than this are not sent as a GET.
    pub max_query_url_len: usize,
    /// Truncation length for the pixel payload's text fields.
    pub pixel_field_chars: usize,
}

impl Default for DeliveryLimits {
    fn default() -> Self {
        Self {
            max_query_url_len: MAX_QUERY_URL_LEN,
            pixel_field_chars: PIXEL_FIELD_CHARS,
        }
    }
}

impl DeliveryLimits {
    /// Whether a query URL of `len` characters exceeds the GET threshold.
    pub fn query_too_long(&self, len: usize) -> bool {
        len > self.max_query_url_len
    }
}

/// Build `endpoint?data=<urlencoded json>`.
///
/// The endpoint is used verbatim; configuration rejects endpoints that
/// already carry a query string.
pub fn query_url(endpoint: &str, json: &str) -> String {
    format!("{endpoint}?{DATA_PARAM}={}", urlencoding::encode(json))
}

/// Length of a URL in characters, the unit the GET threshold is expressed in.
pub fn url_len(url: &str) -> usize {
    url.chars().count()
}
