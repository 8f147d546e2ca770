use crate::i18n::{LanguageRegistry, SYSTEM_DEFAULT_LANGUAGE};
use crate::provider::DEFAULT_TRANSLATE_API_URL;
use anyhow::{Context, Result};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    // Translation provider
    pub translate_api_key: Option<String>,
    pub translate_api_url: String,
    pub translate_timeout_secs: u64,

    // Languages
    pub supported_languages: Vec<String>,
    pub default_language: String,

    // Fan-out pool
    pub max_in_flight: usize,
    pub stagger_ms: u64,

    // Server
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let supported_languages = match std::env::var("SUPPORTED_LANGUAGES") {
            Ok(list) if !list.trim().is_empty() => parse_language_list(&list),
            _ => LanguageRegistry::default()
                .codes()
                .map(str::to_string)
                .collect(),
        };

        let config = Self {
            // Translation provider - no key means translations are skipped
            translate_api_key: std::env::var("TRANSLATE_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            translate_api_url: std::env::var("TRANSLATE_API_URL")
                .unwrap_or_else(|_| DEFAULT_TRANSLATE_API_URL.to_string()),
            translate_timeout_secs: std::env::var("TRANSLATE_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),

            // Languages
            supported_languages,
            default_language: std::env::var("DEFAULT_LANGUAGE")
                .unwrap_or_else(|_| SYSTEM_DEFAULT_LANGUAGE.to_string()),

            // Fan-out pool
            max_in_flight: std::env::var("TRANSLATE_MAX_IN_FLIGHT")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(4),
            stagger_ms: std::env::var("TRANSLATE_STAGGER_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(100),

            // Server
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
        };

        config
            .language_registry()
            .context("Invalid SUPPORTED_LANGUAGES / DEFAULT_LANGUAGE")?;

        Ok(config)
    }

    /// The enabled languages described by this config.
    pub fn language_registry(&self) -> Result<LanguageRegistry> {
        Ok(LanguageRegistry::new(
            &self.supported_languages,
            &self.default_language,
        )?)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.translate_timeout_secs)
    }

    pub fn stagger(&self) -> Duration {
        Duration::from_millis(self.stagger_ms)
    }
}

fn parse_language_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(|code| code.trim().to_ascii_lowercase())
        .filter(|code| !code.is_empty())
        .collect()
}
