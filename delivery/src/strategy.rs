//! The fallback ladder, declared as data.
//!
//! Each [`Strategy`] turns a payload into one [`WireRequest`] (or a reason to
//! skip). The negotiator walks [`LADDER`] in order; nothing here does I/O.

use std::fmt;

use beacon_common::limits::{query_url, url_len};
use beacon_common::{DeliveryLimits, FeedbackPayload};

use crate::transport::Capabilities;

/// One transport technique for attempting delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Full JSON document as a POST body.
    Structured,
    /// Full JSON document URL-encoded into `?data=`.
    EncodedQuery,
    /// Truncated JSON document requested through the image side channel.
    Pixel,
}

/// Strategies in the order they are attempted.
pub const LADDER: [Strategy; 3] = [Strategy::Structured, Strategy::EncodedQuery, Strategy::Pixel];

impl Strategy {
    /// 1-based position on the ladder.
    pub fn rank(self) -> u8 {
        match self {
            Strategy::Structured => 1,
            Strategy::EncodedQuery => 2,
            Strategy::Pixel => 3,
        }
    }

    /// The last rung: it cannot observe success and has no fallback.
    pub fn is_terminal(self) -> bool {
        matches!(self, Strategy::Pixel)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Structured => "structured",
            Strategy::EncodedQuery => "encoded_query",
            Strategy::Pixel => "pixel",
        }
    }

    fn supported_by(self, caps: Capabilities) -> bool {
        match self {
            Strategy::Structured | Strategy::EncodedQuery => caps.structured,
            Strategy::Pixel => caps.pixel,
        }
    }

    /// Derive this strategy's request from `payload`.
    pub fn prepare(
        self,
        payload: &FeedbackPayload,
        endpoint: &str,
        limits: &DeliveryLimits,
        caps: Capabilities,
    ) -> Prepared {
        if !self.supported_by(caps) {
            return Prepared::Skip(SkipReason::Unsupported);
        }
        match self {
            Strategy::Structured => match payload.to_json() {
                Ok(body) => Prepared::Request(WireRequest::Post {
                    url: endpoint.to_string(),
                    body,
                }),
                Err(e) => Prepared::Skip(SkipReason::Encoding(e.to_string())),
            },
            Strategy::EncodedQuery => match payload.to_json() {
                Ok(json) => {
                    let url = query_url(endpoint, &json);
                    let len = url_len(&url);
                    if limits.query_too_long(len) {
                        Prepared::Skip(SkipReason::QueryTooLong {
                            len,
                            limit: limits.max_query_url_len,
                        })
                    } else {
                        Prepared::Request(WireRequest::Get { url })
                    }
                }
                Err(e) => Prepared::Skip(SkipReason::Encoding(e.to_string())),
            },
            Strategy::Pixel => match payload.pixel(limits.pixel_field_chars).to_json() {
                Ok(json) => Prepared::Request(WireRequest::Pixel {
                    url: query_url(endpoint, &json),
                }),
                Err(e) => Prepared::Skip(SkipReason::Encoding(e.to_string())),
            },
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.as_str(), self.rank())
    }
}

/// A request ready to hand to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireRequest {
    Post { url: String, body: String },
    Get { url: String },
    Pixel { url: String },
}

impl WireRequest {
    pub fn url(&self) -> &str {
        match self {
            WireRequest::Post { url, .. } | WireRequest::Get { url } | WireRequest::Pixel { url } => {
                url
            }
        }
    }
}

/// Why a strategy was passed over without touching the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The encoded query URL is longer than the GET threshold.
    QueryTooLong { len: usize, limit: usize },
    /// The runtime lacks the mechanism this strategy needs.
    Unsupported,
    /// The payload could not be serialized.
    Encoding(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::QueryTooLong { len, limit } => {
                write!(f, "query URL is {len} chars, limit {limit}")
            }
            SkipReason::Unsupported => write!(f, "transport not available"),
            SkipReason::Encoding(msg) => write!(f, "encoding failed: {msg}"),
        }
    }
}

/// Result of [`Strategy::prepare`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prepared {
    Request(WireRequest),
    Skip(SkipReason),
}
