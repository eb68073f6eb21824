//! Command-line feedback submitter.
//!
//! Sends one survey answer down the delivery ladder and waits for the walk to
//! finish, so the process does not exit before the request leaves. With
//! `--plan` it prints what each rung would send instead.

use std::sync::Arc;

use anyhow::{Context, Result};
use beacon_common::{AmbientSources, FeedbackPayload, FixedIdentifier, IdentifierProvider};
use beacon_delivery::{DeliveryConfig, HttpTransport, Negotiator, Prepared, WireRequest};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "beacon-cli", about = "Submit survey feedback to a collection endpoint")]
struct Cli {
    /// Collection endpoint URL.
    #[arg(long, env = "BEACON_ENDPOINT_URL")]
    endpoint: String,

    /// Session identifier to attach (takes precedence over --cookie).
    #[arg(long)]
    session_id: Option<String>,

    /// Cookie header to read the `_clarity` session identifier from.
    #[arg(long)]
    cookie: Option<String>,

    /// URL of the page the feedback refers to.
    #[arg(long, default_value = "")]
    page_url: String,

    /// Print each strategy's request without sending anything.
    #[arg(long)]
    plan: bool,

    /// Log every ladder transition.
    #[arg(short, long)]
    verbose: bool,

    /// The feedback text.
    feedback: String,
}

impl Cli {
    fn identifier(&self) -> Arc<dyn IdentifierProvider> {
        match &self.session_id {
            Some(id) => Arc::new(FixedIdentifier::new(id.clone())),
            None => Arc::new(AmbientSources {
                cookie_header: self.cookie.clone(),
                ..Default::default()
            }),
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn print_plan(negotiator: &Negotiator<HttpTransport>, payload: &FeedbackPayload) {
    for (strategy, prepared) in negotiator.plan(payload) {
        match prepared {
            Prepared::Request(WireRequest::Post { url, body }) => {
                println!("{strategy}: POST {url}\n    {body}");
            }
            Prepared::Request(WireRequest::Get { url }) => {
                println!("{strategy}: GET {url}");
            }
            Prepared::Request(WireRequest::Pixel { url }) => {
                println!("{strategy}: PIXEL {url}");
            }
            Prepared::Skip(reason) => println!("{strategy}: skipped ({reason})"),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = DeliveryConfig::new(&cli.endpoint).context("invalid --endpoint")?;
    let identifier = cli.identifier();
    let payload = FeedbackPayload::capture(&cli.feedback, identifier.as_ref(), cli.page_url.clone())
        .context("nothing to send")?;
    let negotiator = Negotiator::from_config(HttpTransport::new(), &config);

    if cli.plan {
        print_plan(&negotiator, &payload);
        return Ok(());
    }

    let report = negotiator.deliver(&payload).await;
    info!(
        state = ?report.state,
        session_id = payload.session_id(),
        "feedback submitted"
    );
    Ok(())
}
