use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

use crate::identity::IdentifierProvider;

/// Errors raised while building or encoding a payload.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("feedback is empty")]
    EmptyFeedback,
    #[error("failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),
}

/// One survey answer, frozen at submission time.
///
/// Immutable after construction. Each delivery strategy derives its own wire
/// form from it (`to_json`, `pixel`) without touching the original.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackPayload {
    #[serde(serialize_with = "serialize_iso_millis")]
    timestamp: DateTime<Utc>,
    feedback: String,
    #[serde(rename = "clarityId")]
    session_id: String,
    #[serde(rename = "url")]
    page_url: String,
}

impl FeedbackPayload {
    /// Build a payload. Surrounding whitespace is trimmed from `feedback`;
    /// nothing left afterwards is an error.
    pub fn new(
        feedback: &str,
        session_id: impl Into<String>,
        page_url: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, PayloadError> {
        let feedback = feedback.trim();
        if feedback.is_empty() {
            return Err(PayloadError::EmptyFeedback);
        }
        Ok(Self {
            timestamp,
            feedback: feedback.to_string(),
            session_id: session_id.into(),
            page_url: page_url.into(),
        })
    }

    /// Build a payload stamped now, asking `identifier` once for the session id.
    pub fn capture(
        feedback: &str,
        identifier: &dyn IdentifierProvider,
        page_url: impl Into<String>,
    ) -> Result<Self, PayloadError> {
        // Validate before consulting the provider so blank input has no side effects.
        if feedback.trim().is_empty() {
            return Err(PayloadError::EmptyFeedback);
        }
        Self::new(feedback, identifier.session_id(), page_url, Utc::now())
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn feedback(&self) -> &str {
        &self.feedback
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn page_url(&self) -> &str {
        &self.page_url
    }

    /// Full wire document: `timestamp`, `feedback`, `clarityId`, `url`.
    pub fn to_json(&self) -> Result<String, PayloadError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Minimal document for the pixel request, keeping only the first
    /// `max_chars` characters of the feedback and page URL.
    pub fn pixel(&self, max_chars: usize) -> PixelPayload {
        PixelPayload {
            timestamp: iso_millis(&self.timestamp),
            f: leading_chars(&self.feedback, max_chars).to_string(),
            u: leading_chars(&self.page_url, max_chars).to_string(),
        }
    }
}

/// Truncated payload carried by the image-pixel request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelPayload {
    pub timestamp: String,
    /// Leading characters of the feedback.
    pub f: String,
    /// Leading characters of the page URL.
    pub u: String,
}

impl PixelPayload {
    pub fn to_json(&self) -> Result<String, PayloadError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// ISO-8601 with millisecond precision and a `Z` suffix, e.g. `2026-10-16T09:30:00.123Z`.
pub fn iso_millis(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn serialize_iso_millis<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&iso_millis(ts))
}

/// Prefix of `s` holding at most `n` characters.
fn leading_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
