use anyhow::{Context, Result};
use content_localizer::{config::Config, localizer::Localizer, server};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("content_localizer=info".parse()?),
        )
        .init();

    info!("Starting content localizer");

    // Load configuration from environment
    let config = Config::from_env()?;
    let localizer = Localizer::from_config(&config)?;

    info!(
        "Translating into {} languages (default '{}')",
        localizer.registry().list_enabled().len(),
        localizer.registry().default_language().code
    );

    let app = server::router(Arc::new(localizer));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
