//! Transport capabilities the ladder is built on.
//!
//! A transport only reports whether the network layer accepted a request.
//! Responses from the collection endpoint are opaque: a 500 and a 200 are
//! both "dispatched".

use async_trait::async_trait;
use thiserror::Error;

/// Network or protocol level failure reported by a transport.
///
/// The only delivery error. It never reaches the caller; the negotiator logs
/// it and moves to the next strategy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("transport failure: {reason}")]
pub struct TransportFailure {
    reason: String,
}

impl TransportFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Request mechanisms available in the current runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Requests with a method and body (fetch, HTTP client).
    pub structured: bool,
    /// Image-load side channel with no readable result.
    pub pixel: bool,
}

impl Capabilities {
    pub const ALL: Capabilities = Capabilities {
        structured: true,
        pixel: true,
    };
}

/// Fire-and-forget request issuer.
///
/// `Ok(())` means the request left without a transport-level error, not that
/// the endpoint accepted it.
#[cfg_attr(target_family = "wasm", async_trait(?Send))]
#[cfg_attr(not(target_family = "wasm"), async_trait)]
pub trait Transport {
    fn capabilities(&self) -> Capabilities;

    /// POST `body` as `application/json` to `url`.
    async fn send_structured(&self, url: &str, body: &str) -> Result<(), TransportFailure>;

    /// GET `url` through the structured-request mechanism.
    async fn send_query(&self, url: &str) -> Result<(), TransportFailure>;

    /// Request `url` through the pixel side channel.
    async fn send_pixel(&self, url: &str) -> Result<(), TransportFailure>;
}
