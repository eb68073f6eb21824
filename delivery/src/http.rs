//! Native transport over `reqwest`.
//!
//! Mirrors the browser semantics: the response is never read, any status
//! counts as dispatched, and only connection-level errors are failures. No
//! timeout is set beyond the client's own defaults.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;

use crate::transport::{Capabilities, Transport, TransportFailure};

#[derive(Clone, Debug, Default)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

fn failure(e: reqwest::Error) -> TransportFailure {
    TransportFailure::new(e.to_string())
}

#[async_trait]
impl Transport for HttpTransport {
    fn capabilities(&self) -> Capabilities {
        Capabilities::ALL
    }

    async fn send_structured(&self, url: &str, body: &str) -> Result<(), TransportFailure> {
        self.client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_string())
            .send()
            .await
            .map_err(failure)?;
        Ok(())
    }

    async fn send_query(&self, url: &str) -> Result<(), TransportFailure> {
        self.client.get(url).send().await.map_err(failure)?;
        Ok(())
    }

    async fn send_pixel(&self, url: &str) -> Result<(), TransportFailure> {
        self.client
            .get(url)
            .header(ACCEPT, "image/*")
            .send()
            .await
            .map_err(failure)?;
        Ok(())
    }
}
