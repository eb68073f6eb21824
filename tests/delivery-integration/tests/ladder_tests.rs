//! End-to-end ladder tests against a loopback collector over real HTTP.

use std::sync::Arc;

use axum::http::StatusCode;
use beacon_common::{AmbientSources, DeliveryLimits, FeedbackPayload, FixedIdentifier};
use beacon_delivery::{
    AttemptOutcome, DeliveryState, FeedbackSurvey, Negotiator, Strategy, SubmitOutcome,
    SurveyConfig,
};
use chrono::Utc;

use beacon_integration::{closed_endpoint, loopback_transport, Collector, PostBlocked};

fn payload(feedback: &str, session_id: &str) -> FeedbackPayload {
    FeedbackPayload::new(
        feedback,
        session_id,
        "https://shop.example/booking/success?id=991",
        Utc::now(),
    )
    .unwrap()
}

#[tokio::test]
async fn reachable_endpoint_receives_single_post() {
    tracing_subscriber::fmt::try_init().ok();
    let collector = Collector::start().await;
    let negotiator = Negotiator::new(
        loopback_transport(),
        collector.endpoint(),
        DeliveryLimits::default(),
    );

    let report = negotiator
        .deliver(&payload("Price was too high", "clar-1"))
        .await;

    assert_eq!(report.state, DeliveryState::Sent(Strategy::Structured));
    let received = collector.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].method, "POST");
    let doc = received[0].document();
    assert_eq!(doc["feedback"], "Price was too high");
    assert_eq!(doc["clarityId"], "clar-1");
    assert_eq!(doc["url"], "https://shop.example/booking/success?id=991");
    assert!(doc["timestamp"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn error_status_is_not_a_transport_failure() {
    let collector = Collector::start_with_post_status(StatusCode::INTERNAL_SERVER_ERROR).await;
    let negotiator = Negotiator::new(
        loopback_transport(),
        collector.endpoint(),
        DeliveryLimits::default(),
    );

    let report = negotiator.deliver(&payload("hello", "clar-2")).await;

    assert_eq!(report.state, DeliveryState::Sent(Strategy::Structured));
    assert_eq!(collector.received().len(), 1);
}

#[tokio::test]
async fn blocked_post_falls_back_to_encoded_query() {
    let collector = Collector::start().await;
    let negotiator = Negotiator::new(
        PostBlocked(loopback_transport()),
        collector.endpoint(),
        DeliveryLimits::default(),
    );
    let p = payload("Couldn't find the promo code field & gave up", "clar-3");

    let report = negotiator.deliver(&p).await;

    assert_eq!(report.state, DeliveryState::Sent(Strategy::EncodedQuery));
    let received = collector.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].method, "GET");
    assert_eq!(received[0].data.as_deref(), Some(p.to_json().unwrap().as_str()));
}

#[tokio::test]
async fn long_feedback_goes_straight_to_pixel() {
    let collector = Collector::start().await;
    let negotiator = Negotiator::new(
        PostBlocked(loopback_transport()),
        collector.endpoint(),
        DeliveryLimits::default(),
    );
    let long = "The seat map kept reloading. ".repeat(200);
    assert!(long.len() >= 5000);

    let report = negotiator.deliver(&payload(&long, "clar-4")).await;

    assert_eq!(report.state, DeliveryState::Exhausted);
    let received = collector.received();
    assert_eq!(received.len(), 1, "query strategy must not be dispatched");
    assert_eq!(received[0].accept.as_deref(), Some("image/*"));
    let doc = received[0].document();
    let f = doc["f"].as_str().unwrap();
    assert_eq!(f.chars().count(), 100);
    assert!(long.starts_with(f));
    assert!(doc["u"].as_str().unwrap().chars().count() <= 100);
    assert!(doc.get("clarityId").is_none());
}

#[tokio::test]
async fn unreachable_endpoint_exhausts_ladder() {
    let endpoint = closed_endpoint().await;
    let negotiator = Negotiator::new(loopback_transport(), endpoint, DeliveryLimits::default());

    let report = negotiator.deliver(&payload("anyone there?", "clar-5")).await;

    assert_eq!(report.state, DeliveryState::Exhausted);
    assert_eq!(report.attempts.len(), 3);
    assert!(report
        .attempts
        .iter()
        .all(|a| matches!(a.outcome, AttemptOutcome::Failed(_))));
}

#[tokio::test]
async fn survey_confirms_regardless_of_delivery() {
    let endpoint = closed_endpoint().await;
    let survey = FeedbackSurvey::new(
        SurveyConfig::default(),
        Negotiator::new(loopback_transport(), endpoint, DeliveryLimits::default()),
        Arc::new(AmbientSources::default()),
        || "https://shop.example/success".to_string(),
    );

    assert!(matches!(
        survey.submit("Price was too high"),
        SubmitOutcome::Confirmed { .. }
    ));
    assert_eq!(survey.submit("   "), SubmitOutcome::Ignored);
}

#[tokio::test]
async fn survey_delivers_in_background() {
    let collector = Collector::start().await;
    let survey = FeedbackSurvey::new(
        SurveyConfig::default(),
        Negotiator::new(
            loopback_transport(),
            collector.endpoint(),
            DeliveryLimits::default(),
        ),
        Arc::new(FixedIdentifier::new("clar-6")),
        || "https://shop.example/success".to_string(),
    );

    survey.submit("Loved it");

    tokio::time::timeout(std::time::Duration::from_secs(5), async {
        while collector.received().is_empty() {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("background delivery should reach the collector");
    assert_eq!(collector.received()[0].document()["clarityId"], "clar-6");
}
