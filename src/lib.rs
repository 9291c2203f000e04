pub mod analyzer;
pub mod auth;
pub mod commands;
pub mod config;
pub mod db;
pub mod doc_processor;
pub mod error;
pub mod guard;
pub mod llm;
pub mod pipeline;
pub mod prompts;
pub mod responder;
pub mod state;

#[cfg(test)]
mod test_support;

use config::Config;
use state::AppState;

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
}

pub async fn run(config: Config) -> anyhow::Result<()> {
    let state = AppState::from_config(&config)?;
    let app = commands::router(state, config.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    tracing::info!(addr = %config.bind, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
