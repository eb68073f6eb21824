//! WASM bindings: `fetch`/image transports, ambient identifier lookup and the
//! page-facing entry points.

use std::sync::Arc;

use async_trait::async_trait;
use beacon_common::identity::CLARITY_KEY;
use beacon_common::{AmbientSources, IdentifierProvider};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use crate::config::DeliveryConfig;
use crate::negotiator::Negotiator;
use crate::survey::{FeedbackSurvey, SubmitOutcome, SurveyConfig};
use crate::transport::{Capabilities, Transport, TransportFailure};

// ─── Transport ───────────────────────────────────────────────────────────────

/// `fetch` in `no-cors` mode for structured and query requests, an
/// `Image` load for the pixel.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserTransport;

async fn fetch_no_cors(url: &str, method: &str, body: Option<&str>) -> Result<(), TransportFailure> {
    let opts = web_sys::RequestInit::new();
    opts.set_method(method);
    opts.set_mode(web_sys::RequestMode::NoCors);

    if let Some(b) = body {
        opts.set_body(&JsValue::from_str(b));
    }

    let request = web_sys::Request::new_with_str_and_init(url, &opts)
        .map_err(|e| TransportFailure::new(format!("failed to create request: {e:?}")))?;

    if body.is_some() {
        request
            .headers()
            .set("Content-Type", "application/json")
            .map_err(|e| TransportFailure::new(format!("failed to set header: {e:?}")))?;
    }

    let window = web_sys::window().ok_or_else(|| TransportFailure::new("no window"))?;
    // The opaque response carries nothing worth reading.
    JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(|e| TransportFailure::new(format!("fetch failed: {e:?}")))?;
    Ok(())
}

#[async_trait(?Send)]
impl Transport for BrowserTransport {
    fn capabilities(&self) -> Capabilities {
        let has_window = web_sys::window().is_some();
        Capabilities {
            structured: has_window,
            pixel: has_window,
        }
    }

    async fn send_structured(&self, url: &str, body: &str) -> Result<(), TransportFailure> {
        fetch_no_cors(url, "POST", Some(body)).await
    }

    async fn send_query(&self, url: &str) -> Result<(), TransportFailure> {
        fetch_no_cors(url, "GET", None).await
    }

    async fn send_pixel(&self, url: &str) -> Result<(), TransportFailure> {
        let img = web_sys::HtmlImageElement::new()
            .map_err(|e| TransportFailure::new(format!("failed to create image: {e:?}")))?;
        img.set_src(url);
        Ok(())
    }
}

// ─── Identifier ──────────────────────────────────────────────────────────────

/// Reads `window.clarity.v`, then `localStorage["_clarity"]`, then the
/// `_clarity` cookie.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserIdentifier;

impl BrowserIdentifier {
    pub fn sources() -> AmbientSources {
        let Some(window) = web_sys::window() else {
            return AmbientSources::default();
        };

        let analytics_global = js_sys::Reflect::get(&window, &JsValue::from_str("clarity"))
            .ok()
            .filter(|obj| obj.is_object())
            .and_then(|obj| js_sys::Reflect::get(&obj, &JsValue::from_str("v")).ok())
            .and_then(|v| v.as_string());

        let local_storage = window
            .local_storage()
            .ok()
            .flatten()
            .and_then(|storage| storage.get_item(CLARITY_KEY).ok().flatten());

        let cookie_header = window
            .document()
            .and_then(|doc| doc.dyn_into::<web_sys::HtmlDocument>().ok())
            .and_then(|doc| doc.cookie().ok());

        AmbientSources {
            analytics_global,
            local_storage,
            cookie_header,
        }
    }
}

impl IdentifierProvider for BrowserIdentifier {
    fn session_id(&self) -> String {
        Self::sources().resolve()
    }
}

fn current_page_url() -> String {
    web_sys::window()
        .and_then(|w| w.location().href().ok())
        .unwrap_or_default()
}

// ─── Page entry points ───────────────────────────────────────────────────────

fn browser_survey() -> Result<FeedbackSurvey<BrowserTransport>, JsValue> {
    let config = DeliveryConfig::from_env().map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(FeedbackSurvey::new(
        SurveyConfig::default(),
        Negotiator::from_config(BrowserTransport, &config),
        Arc::new(BrowserIdentifier),
        current_page_url,
    ))
}

/// The survey question for the host page to display.
#[wasm_bindgen]
pub fn survey_question() -> String {
    SurveyConfig::default().question
}

/// Submit an answer. Returns the thank-you message to show, or `undefined`
/// when the answer was blank and nothing was sent.
#[wasm_bindgen]
pub fn submit_feedback(text: &str) -> Result<Option<String>, JsValue> {
    match browser_survey()?.submit(text) {
        SubmitOutcome::Confirmed { message, .. } => Ok(Some(message)),
        SubmitOutcome::Ignored => Ok(None),
    }
}

/// Milliseconds the host keeps the thank-you message visible.
#[wasm_bindgen]
pub fn dismiss_after_ms() -> u32 {
    SurveyConfig::default().dismiss_after.as_millis() as u32
}
