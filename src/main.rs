//! Souk Storefront - storefront and admin API server

use anyhow::Result;
use souk_storefront::{router, AppState, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let port = config.port;
    let state = AppState::connect(config).await?;
    tracing::info!(events = state.events.is_enabled(), "state ready");
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    tracing::info!("Souk storefront listening on 0.0.0.0:{}", port);
    axum::serve(listener, app).await?;
    Ok(())
}
