//! Best-effort delivery of survey feedback to a collection endpoint.
//!
//! A [`Negotiator`] walks a fixed ladder of transport strategies
//! (structured POST, encoded-query GET, truncated pixel GET) and stops at the
//! first one the network layer accepts. Nothing about the outcome is returned
//! to the caller.

pub mod config;
pub mod negotiator;
pub mod strategy;
pub mod survey;
pub mod transport;

#[cfg(not(target_family = "wasm"))]
pub mod http;

#[cfg(target_family = "wasm")]
pub mod browser;

pub use config::{ConfigError, DeliveryConfig};
pub use negotiator::{
    Attempt, AttemptOutcome, BackgroundTransport, DeliveryReport, DeliveryState, Negotiator,
};
pub use strategy::{Prepared, SkipReason, Strategy, WireRequest, LADDER};
pub use survey::{FeedbackSurvey, SubmitOutcome, SurveyConfig};
pub use transport::{Capabilities, Transport, TransportFailure};

#[cfg(not(target_family = "wasm"))]
pub use http::HttpTransport;
