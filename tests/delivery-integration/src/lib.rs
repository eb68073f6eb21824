//! Loopback collection endpoint and transport wrappers for end-to-end
//! delivery tests.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::extract::{Query, State};
use axum::http::header::ACCEPT;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use beacon_delivery::{Capabilities, HttpTransport, Transport, TransportFailure};

/// Path the collector listens on.
pub const COLLECT_PATH: &str = "/exec";

/// One request as seen by the collector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Received {
    pub method: &'static str,
    /// Decoded `data` query parameter, if any.
    pub data: Option<String>,
    pub body: Option<String>,
    pub accept: Option<String>,
}

impl Received {
    /// The JSON document carried by the body or the `data` parameter.
    pub fn document(&self) -> serde_json::Value {
        let raw = self
            .body
            .as_deref()
            .or(self.data.as_deref())
            .expect("request carried no document");
        serde_json::from_str(raw).expect("document should be JSON")
    }
}

#[derive(Clone)]
struct CollectorState {
    received: Arc<Mutex<Vec<Received>>>,
    post_status: StatusCode,
}

/// A collection endpoint on an ephemeral loopback port.
pub struct Collector {
    addr: SocketAddr,
    received: Arc<Mutex<Vec<Received>>>,
}

impl Collector {
    /// Start a collector that answers POSTs with 200.
    pub async fn start() -> Self {
        Self::start_with_post_status(StatusCode::OK).await
    }

    /// Start a collector that answers POSTs with `post_status`.
    pub async fn start_with_post_status(post_status: StatusCode) -> Self {
        let received = Arc::new(Mutex::new(Vec::new()));
        let state = CollectorState {
            received: Arc::clone(&received),
            post_status,
        };

        let app = Router::new()
            .route(COLLECT_PATH, post(record_post).get(record_get))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind collector");
        let addr = listener.local_addr().expect("collector has no address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Collector failed");
        });

        Self { addr, received }
    }

    pub fn endpoint(&self) -> String {
        format!("http://{}{}", self.addr, COLLECT_PATH)
    }

    pub fn received(&self) -> Vec<Received> {
        self.received.lock().unwrap().clone()
    }
}

fn accept_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

async fn record_post(
    State(state): State<CollectorState>,
    headers: HeaderMap,
    body: String,
) -> StatusCode {
    state.received.lock().unwrap().push(Received {
        method: "POST",
        data: None,
        body: Some(body),
        accept: accept_header(&headers),
    });
    state.post_status
}

async fn record_get(
    State(state): State<CollectorState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> StatusCode {
    state.received.lock().unwrap().push(Received {
        method: "GET",
        data: params.get("data").cloned(),
        body: None,
        accept: accept_header(&headers),
    });
    StatusCode::OK
}

/// HTTP transport that talks to loopback directly, ignoring proxy settings
/// from the environment.
pub fn loopback_transport() -> HttpTransport {
    let client = reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("Failed to build HTTP client");
    HttpTransport::with_client(client)
}

/// An endpoint on a port nothing listens on.
pub async fn closed_endpoint() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind probe listener");
    let addr = listener.local_addr().expect("probe has no address");
    drop(listener);
    format!("http://{addr}{COLLECT_PATH}")
}

/// Wraps a transport and makes every structured POST fail at the transport
/// level, as a blocked cross-origin request would in a browser.
pub struct PostBlocked<T>(pub T);

#[async_trait]
impl<T: Transport + Send + Sync> Transport for PostBlocked<T> {
    fn capabilities(&self) -> Capabilities {
        self.0.capabilities()
    }

    async fn send_structured(&self, _url: &str, _body: &str) -> Result<(), TransportFailure> {
        Err(TransportFailure::new("blocked by test"))
    }

    async fn send_query(&self, url: &str) -> Result<(), TransportFailure> {
        self.0.send_query(url).await
    }

    async fn send_pixel(&self, url: &str) -> Result<(), TransportFailure> {
        self.0.send_pixel(url).await
    }
}
