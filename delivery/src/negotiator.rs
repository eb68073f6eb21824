//! Drives a payload down the fallback ladder.
//!
//! `NotSent -> Attempting(1..3) -> Sent | Exhausted`. A strategy that is
//! dispatched without a transport error ends the walk in `Sent`; reaching the
//! pixel rung ends it in `Exhausted`, since the pixel cannot observe anything.
//! Neither end state is reported to the caller of [`Negotiator::submit`].

use std::sync::Arc;

use beacon_common::{DeliveryLimits, FeedbackPayload};
use tracing::{debug, info, warn};

use crate::config::DeliveryConfig;
use crate::strategy::{Prepared, SkipReason, Strategy, WireRequest, LADDER};
use crate::transport::{Transport, TransportFailure};

/// Where a delivery currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryState {
    NotSent,
    Attempting(Strategy),
    /// A non-terminal strategy left without transport error. Not a delivery
    /// confirmation: the response is opaque.
    Sent(Strategy),
    /// The structured and query rungs both failed or were skipped, and the
    /// pixel rung was reached.
    Exhausted,
}

impl DeliveryState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DeliveryState::Sent(_) | DeliveryState::Exhausted)
    }
}

/// What happened to a single strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Dispatched,
    Skipped(SkipReason),
    Failed(TransportFailure),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub strategy: Strategy,
    pub outcome: AttemptOutcome,
}

/// Diagnostic trace of one walk down the ladder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub state: DeliveryState,
    pub attempts: Vec<Attempt>,
}

impl DeliveryReport {
    /// Strategies that actually issued a network request.
    pub fn dispatched(&self) -> impl Iterator<Item = Strategy> + '_ {
        self.attempts
            .iter()
            .filter(|a| !matches!(a.outcome, AttemptOutcome::Skipped(_)))
            .map(|a| a.strategy)
    }
}

/// Delivers feedback payloads to one collection endpoint.
pub struct Negotiator<T> {
    transport: Arc<T>,
    endpoint: Arc<str>,
    limits: DeliveryLimits,
}

impl<T> Clone for Negotiator<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            endpoint: Arc::clone(&self.endpoint),
            limits: self.limits,
        }
    }
}

impl<T: Transport> Negotiator<T> {
    pub fn new(transport: T, endpoint: impl Into<String>, limits: DeliveryLimits) -> Self {
        Self {
            transport: Arc::new(transport),
            endpoint: Arc::from(endpoint.into()),
            limits,
        }
    }

    pub fn from_config(transport: T, config: &DeliveryConfig) -> Self {
        Self::new(transport, config.endpoint(), config.limits())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn limits(&self) -> DeliveryLimits {
        self.limits
    }

    /// Each rung's prepared request, without touching the network.
    pub fn plan(&self, payload: &FeedbackPayload) -> Vec<(Strategy, Prepared)> {
        let caps = self.transport.capabilities();
        LADDER
            .iter()
            .map(|&s| (s, s.prepare(payload, &self.endpoint, &self.limits, caps)))
            .collect()
    }

    /// Walk the ladder once and report how it ended.
    ///
    /// At most one request per strategy; strategy *n+1* starts only after
    /// strategy *n* failed or was skipped.
    pub async fn deliver(&self, payload: &FeedbackPayload) -> DeliveryReport {
        let caps = self.transport.capabilities();
        let mut state = DeliveryState::NotSent;
        let mut attempts = Vec::with_capacity(LADDER.len());
        debug!(state = ?state, endpoint = %self.endpoint, "delivery starting");

        for strategy in LADDER {
            state = DeliveryState::Attempting(strategy);
            debug!(state = ?state, "attempting delivery");

            let outcome = match strategy.prepare(payload, &self.endpoint, &self.limits, caps) {
                Prepared::Skip(reason) => {
                    debug!(%strategy, %reason, "strategy skipped");
                    AttemptOutcome::Skipped(reason)
                }
                Prepared::Request(request) => {
                    debug!(%strategy, url_len = request.url().len(), "dispatching");
                    match self.dispatch(&request).await {
                        Ok(()) => AttemptOutcome::Dispatched,
                        Err(failure) => {
                            warn!(%strategy, reason = failure.reason(), "transport failure");
                            AttemptOutcome::Failed(failure)
                        }
                    }
                }
            };

            let dispatched = outcome == AttemptOutcome::Dispatched;
            attempts.push(Attempt { strategy, outcome });

            if strategy.is_terminal() {
                state = DeliveryState::Exhausted;
                break;
            }
            if dispatched {
                state = DeliveryState::Sent(strategy);
                break;
            }
        }

        info!(state = ?state, attempts = attempts.len(), "delivery finished");
        DeliveryReport { state, attempts }
    }

    async fn dispatch(&self, request: &WireRequest) -> Result<(), TransportFailure> {
        match request {
            WireRequest::Post { url, body } => self.transport.send_structured(url, body).await,
            WireRequest::Get { url } => self.transport.send_query(url).await,
            WireRequest::Pixel { url } => self.transport.send_pixel(url).await,
        }
    }
}

/// A transport whose deliveries can run detached from the caller.
#[cfg(not(target_family = "wasm"))]
pub trait BackgroundTransport: Transport + Send + Sync + 'static {}

#[cfg(not(target_family = "wasm"))]
impl<T: Transport + Send + Sync + 'static> BackgroundTransport for T {}

/// A transport whose deliveries can run detached from the caller.
#[cfg(target_family = "wasm")]
pub trait BackgroundTransport: Transport + 'static {}

#[cfg(target_family = "wasm")]
impl<T: Transport + 'static> BackgroundTransport for T {}

impl<T: BackgroundTransport> Negotiator<T> {
    /// Start delivery in the background and return immediately.
    ///
    /// This is the only entry point callers need: nothing about the outcome
    /// comes back. Natively it needs a running tokio runtime; without one the
    /// payload is dropped with a warning.
    pub fn submit(&self, payload: FeedbackPayload) {
        let negotiator = self.clone();
        let task = async move {
            negotiator.deliver(&payload).await;
        };

        #[cfg(not(target_family = "wasm"))]
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(task);
            }
            Err(_) => warn!("no async runtime available, feedback dropped"),
        }

        #[cfg(target_family = "wasm")]
        wasm_bindgen_futures::spawn_local(task);
    }
}
