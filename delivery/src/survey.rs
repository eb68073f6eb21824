//! Conversion survey front: validates the answer, hands it to the negotiator,
//! and confirms.
//!
//! Confirmation never depends on delivery. The negotiator runs detached and
//! its outcome is not observable here.

use std::sync::Arc;
use std::time::Duration;

use beacon_common::{FeedbackPayload, IdentifierProvider};
use tracing::debug;

use crate::negotiator::{BackgroundTransport, Negotiator};

/// Texts and timing shown by the host around a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurveyConfig {
    pub question: String,
    pub thank_you_message: String,
    /// How long the host keeps the thank-you message up before removing the overlay.
    pub dismiss_after: Duration,
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            question: "Hi, thank you for your booking. Quick question before you go... \
                       If anything nearly stopped you booking today, what was it? Thanks!"
                .to_string(),
            thank_you_message: "Thank you for your feedback! We appreciate your input.".to_string(),
            dismiss_after: Duration::from_secs(3),
        }
    }
}

/// What the host should do after a submit click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Show `message`, then dismiss after `dismiss_after`.
    Confirmed {
        message: String,
        dismiss_after: Duration,
    },
    /// Blank answer: keep the survey open, nothing was sent.
    Ignored,
}

type PageUrlFn = dyn Fn() -> String + Send + Sync;

pub struct FeedbackSurvey<T> {
    config: SurveyConfig,
    negotiator: Negotiator<T>,
    identifier: Arc<dyn IdentifierProvider>,
    page_url: Arc<PageUrlFn>,
}

impl<T: BackgroundTransport> FeedbackSurvey<T> {
    /// `page_url` is read at each submission.
    pub fn new(
        config: SurveyConfig,
        negotiator: Negotiator<T>,
        identifier: Arc<dyn IdentifierProvider>,
        page_url: impl Fn() -> String + Send + Sync + 'static,
    ) -> Self {
        Self {
            config,
            negotiator,
            identifier,
            page_url: Arc::new(page_url),
        }
    }

    pub fn config(&self) -> &SurveyConfig {
        &self.config
    }

    pub fn negotiator(&self) -> &Negotiator<T> {
        &self.negotiator
    }

    /// Submit one answer. Blank input is ignored; anything else is handed to
    /// the negotiator and confirmed immediately.
    pub fn submit(&self, raw: &str) -> SubmitOutcome {
        let payload =
            match FeedbackPayload::capture(raw, self.identifier.as_ref(), (self.page_url)()) {
                Ok(payload) => payload,
                Err(e) => {
                    debug!("survey answer ignored: {e}");
                    return SubmitOutcome::Ignored;
                }
            };
        self.negotiator.submit(payload);
        SubmitOutcome::Confirmed {
            message: self.config.thank_you_message.clone(),
            dismiss_after: self.config.dismiss_after,
        }
    }
}
