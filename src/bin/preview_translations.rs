//! Preview binary - builds the translation table for a JSON file and prints it
//!
//! Usage:
//!   cargo run --bin preview -- lesson.json
//!
//! The file holds `fields` and `baseLanguage`, e.g.
//!   {"fields": {"title": "Colors"}, "baseLanguage": "en"}
//!
//! Optional environment variables:
//! - TRANSLATE_API_KEY (without it only the base entry is printed)
//! - SUPPORTED_LANGUAGES (defaults to the full catalogue)
//! - DEFAULT_LANGUAGE (defaults to en)

use anyhow::{bail, Context, Result};
use content_localizer::{
    config::Config,
    localizer::{CreateRequest, Localizer},
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("content_localizer=info".parse()?),
        )
        .init();

    // Load environment from .env file
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let args: Vec<String> = std::env::args().collect();
    let Some(path) = args.get(1) else {
        bail!("Usage: preview <lesson.json>");
    };

    info!("Loading configuration...");
    let config = Config::from_env()?;
    let localizer = Localizer::from_config(&config)?;

    let mut request = CreateRequest::from_json_file(path)?;
    request.auto_translate = Some(true);

    info!("Translating {}...", path);
    let outcome = localizer.create(request).await?;

    let json = serde_json::to_string_pretty(&outcome.translations)
        .context("Failed to serialize translations")?;

    println!("\n========== TRANSLATIONS ({}) ==========", outcome.base_language);
    println!("{}", json);
    println!("========================================\n");

    let report = localizer.metrics();
    info!(
        "{} provider calls, {} failures, {} fallbacks",
        report.provider_calls, report.provider_failures, report.fallbacks
    );

    Ok(())
}
