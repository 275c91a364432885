//! Data viewer - browser front-end for facility data files.
//!
//! This is the main entry point for the data viewer web server.
//! The application is organized into the following modules:
//!
//! - `config`: Environment-driven settings
//! - `resolver`: Identifier tuple to lookup URL
//! - `fetcher`: File path lookup and text retrieval
//! - `token`: Bearer token store and refresh loop
//! - `controller`: Per-view resolution state machine
//! - `templates`: HTML/CSS templates and rendering
//! - `handlers`: HTTP route handlers

use std::sync::Arc;

use data_viewer::config::Settings;
use data_viewer::{create_router, AppState, RefreshConfig, RefreshTask};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::from_env()?;
    let state = Arc::new(AppState::new(settings.clone())?);

    let refresh_client = reqwest::Client::builder()
        .timeout(settings.request_timeout)
        .build()?;
    let mut refresh = RefreshTask::spawn(
        state.tokens.clone(),
        refresh_client,
        RefreshConfig {
            url: settings.refresh_url(),
            interval: settings.refresh_interval,
            max_lifetime: settings.refresh_max_lifetime,
        },
    );

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr).await?;
    tracing::info!(
        "Data viewer running at http://{}{}",
        settings.bind_addr,
        settings.base_path
    );
    tracing::info!("Backend API: {}", settings.api_url);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    tracing::info!("Shutting down");
    refresh.cancel();
    refresh.join().await;

    Ok(())
}
