//! # Quiz Live Client
//!
//! Keeps a live leaderboard connection open and reports its status.
//!
//! This is the application entry point that initializes:
//! - Configuration loading
//! - Tracing/logging subsystem
//! - Stored credential
//! - Live connection, notifications and leaderboard cache

use anyhow::Result;
use tracing::info;

use quiz_live_client::config::Settings;
use quiz_live_client::startup::Application;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration from environment and config files
    let settings = Settings::load()?;

    // Initialize tracing subscriber for structured logging
    quiz_live_client::telemetry::init_tracing(settings.telemetry.json);

    info!(
        url = %settings.websocket.url,
        path = %settings.websocket.path,
        environment = %settings.environment,
        "Configuration loaded"
    );

    // Build and run the client
    let application = Application::build(settings)?;

    info!("Client running, press Ctrl-C to stop");
    application.run_until_stopped().await?;

    Ok(())
}
