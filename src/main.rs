//! # Chat Gateway
//!
//! Entry point: initializes logging, loads configuration and serves the
//! WebSocket chat gateway until interrupted.

use anyhow::Result;
use tracing::info;

use chat_gateway::config::Settings;
use chat_gateway::startup::Application;

#[tokio::main]
async fn main() -> Result<()> {
    chat_gateway::telemetry::init_tracing();

    info!("Starting chat gateway...");

    let settings = Settings::load()?;
    info!(
        host = %settings.server.host,
        port = %settings.server.port,
        environment = %settings.environment,
        "Configuration loaded"
    );

    let application = Application::build(settings).await?;

    info!("Gateway ready to accept connections");
    application.run_until_stopped().await?;

    Ok(())
}
