//! AI coding assistant - terminal session
//!
//! A session core with a conversation/code-analysis state machine, driven
//! from a line-oriented terminal front end.

mod assistant;
mod config;
mod identity;
mod repl;
mod runtime;
mod session;
mod state_machine;

use config::AppConfig;
use identity::LocalIdentity;
use runtime::ProductionController;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging. Stdout belongs to the transcript, so logs go to stderr.
    let json = config::log_json_from_env();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coding_assistant=info".into()),
        )
        .with(json.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr)
        }))
        .with((!json).then(|| {
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(std::io::stderr)
        }))
        .init();

    // Configuration
    let config = AppConfig::from_env();

    let assistant = assistant::build_service(&config.assistant)?;
    let identity = LocalIdentity::new(config.user_email.clone());
    if config.user_email.is_none() {
        tracing::info!("No ASSISTANT_USER_EMAIL set, running without a signed-in user");
    }

    let controller = ProductionController::new(assistant, identity, config.controller);
    repl::run(controller).await?;

    tracing::info!("Terminal session closed");
    Ok(())
}
