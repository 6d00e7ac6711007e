//! Coin Toss Frame Service
//!
//! Serves the coin toss game as a Farcaster Frame.

use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use coin_toss_frame::{app, config::Config, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!("App URL: {}", config.app_url);
    tracing::info!("Manifest: {}", config.manifest_path.display());
    tracing::info!("Static files: {}", config.public_dir.display());
    if config.wallet_connect_project_id.is_none() {
        tracing::warn!("WALLETCONNECT_PROJECT_ID not set");
    }

    let port = config.port;
    let state = AppState::from_config(config);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Frame service starting on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await?;
    Ok(())
}
