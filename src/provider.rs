//! Translation backends.
//!
//! A [`TranslationProvider`] turns one text into one target language. The
//! HTTP provider speaks the Google Cloud Translation v2 REST shape; the no-op
//! provider stands in when no credential is configured.

use crate::retry::{with_retry_if, RetryConfig};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Default endpoint of the Google Cloud Translation v2 API.
pub const DEFAULT_TRANSLATE_API_URL: &str =
    "https://translation.googleapis.com/language/translate/v2";

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Translation provider is not configured")]
    Unconfigured,

    #[error("Failed to send translation request: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Translation API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Malformed translation response: {0}")]
    Malformed(String),

    #[error("Translation timed out after {0:?}")]
    Timeout(Duration),
}

impl ProviderError {
    /// Network failures, timeouts, 429 and 5xx are worth retrying.
    /// Other 4xx client errors are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Request(_) | ProviderError::Timeout(_) => true,
            ProviderError::Api { status, .. } => *status == 429 || *status >= 500,
            ProviderError::Unconfigured | ProviderError::Malformed(_) => false,
        }
    }
}

/// A text translation backend.
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Whether a credential is available. Unconfigured providers are never called.
    fn is_configured(&self) -> bool;

    /// Translate `text` from `source` into `target`.
    async fn translate(&self, text: &str, target: &str, source: &str)
        -> Result<String, ProviderError>;
}

/// Provider used when translation is switched off.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProvider;

#[async_trait]
impl TranslationProvider for NoopProvider {
    fn name(&self) -> &str {
        "noop"
    }

    fn is_configured(&self) -> bool {
        false
    }

    async fn translate(
        &self,
        _text: &str,
        _target: &str,
        _source: &str,
    ) -> Result<String, ProviderError> {
        Err(ProviderError::Unconfigured)
    }
}

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'static str,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    data: TranslateData,
}

#[derive(Debug, Deserialize)]
struct TranslateData {
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Translation {
    translated_text: String,
}

/// Google Cloud Translation v2 over HTTP.
#[derive(Debug, Clone)]
pub struct GoogleTranslateProvider {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    retry: RetryConfig,
}

impl GoogleTranslateProvider {
    /// A blank `api_key` counts as no key.
    pub fn new(
        client: reqwest::Client,
        api_url: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client,
            api_url: api_url.into(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            retry: RetryConfig::provider_call(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    async fn send_once(
        &self,
        api_key: &str,
        request: &TranslateRequest<'_>,
    ) -> Result<String, ProviderError> {
        let response = self
            .client
            .post(&self.api_url)
            .query(&[("key", api_key)])
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
            return Err(ProviderError::Api { status, body });
        }

        let parsed: TranslateResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        parsed
            .data
            .translations
            .into_iter()
            .next()
            .map(|t| t.translated_text)
            .ok_or_else(|| {
                ProviderError::Malformed("response contained no translations".to_string())
            })
    }
}

#[async_trait]
impl TranslationProvider for GoogleTranslateProvider {
    fn name(&self) -> &str {
        "google"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn translate(
        &self,
        text: &str,
        target: &str,
        source: &str,
    ) -> Result<String, ProviderError> {
        let api_key = self.api_key.as_deref().ok_or(ProviderError::Unconfigured)?;

        let request = TranslateRequest {
            q: text,
            source,
            target,
            format: "text",
        };

        with_retry_if(
            &self.retry,
            &format!("Translation {} -> {}", source, target),
            || self.send_once(api_key, &request),
            ProviderError::is_retryable,
        )
        .await
    }
}
