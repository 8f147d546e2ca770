use crate::i18n::{LanguageRegistry, TranslationMetrics, TranslationValidator};
use crate::provider::{ProviderError, TranslationProvider};
use crate::throttle::Throttle;
use futures::future::join_all;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Default upper bound for a single provider call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Wraps a provider so that translating never fails.
///
/// Whatever goes wrong (no credential, network error, timeout, a response
/// that fails validation) the caller gets the source text back.
#[derive(Clone)]
pub struct TranslationAdapter {
    provider: Arc<dyn TranslationProvider>,
    metrics: Arc<TranslationMetrics>,
    call_timeout: Duration,
}

impl TranslationAdapter {
    pub fn new(provider: Arc<dyn TranslationProvider>, metrics: Arc<TranslationMetrics>) -> Self {
        Self {
            provider,
            metrics,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_configured()
    }

    /// Translate `text` from `source` to `target`, or return `text` unchanged.
    pub async fn translate(&self, text: &str, target: &str, source: &str) -> String {
        self.try_translate(text, target, source)
            .await
            .unwrap_or_else(|| text.to_string())
    }

    /// Like [`translate`](Self::translate), but `None` when the source text
    /// would have been returned in place of a translation.
    pub async fn try_translate(&self, text: &str, target: &str, source: &str) -> Option<String> {
        if target == source {
            return Some(text.to_string());
        }
        if !self.provider.is_configured() {
            return None;
        }

        self.metrics.record_provider_call();

        let call = self.provider.translate(text, target, source);
        let outcome = match timeout(self.call_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(self.call_timeout)),
        };

        match outcome {
            Ok(translated) => {
                let validation = TranslationValidator::validate(text, &translated);
                if validation.has_warnings() {
                    warn!(
                        "Translation validation warnings for {} -> {}: {:?}",
                        source, target, validation.warnings
                    );
                }
                if validation.has_errors() {
                    warn!(
                        "Discarding translation {} -> {}: {:?}",
                        source, target, validation.errors
                    );
                    self.metrics.record_fallback();
                    return None;
                }
                Some(translated)
            }
            Err(e) => {
                self.metrics.record_provider_failure();
                self.metrics.record_fallback();
                warn!(
                    "Translation {} -> {} via {} failed, keeping source text: {}",
                    source,
                    target,
                    self.provider.name(),
                    e
                );
                None
            }
        }
    }
}

/// Limits for the fan-out worker pool.
#[derive(Debug, Clone)]
pub struct FanOutOptions {
    /// Maximum number of provider calls in flight at once
    pub max_in_flight: usize,
    /// Minimum spacing between two call starts
    pub spacing: Duration,
}

impl Default for FanOutOptions {
    fn default() -> Self {
        Self {
            max_in_flight: 4,
            spacing: Duration::from_millis(100),
        }
    }
}

/// Translates one text into every supported language.
///
/// All fan-outs issued through the same translator share one pool of
/// `max_in_flight` provider calls. Within a single fan-out, call starts are
/// spaced by `spacing`; separate fan-outs are paced independently. Completion
/// order does not matter; each call fills its own key.
pub struct FanOutTranslator {
    adapter: TranslationAdapter,
    registry: Arc<LanguageRegistry>,
    metrics: Arc<TranslationMetrics>,
    in_flight: Semaphore,
    spacing: Duration,
}

impl FanOutTranslator {
    pub fn new(
        adapter: TranslationAdapter,
        registry: Arc<LanguageRegistry>,
        metrics: Arc<TranslationMetrics>,
        options: FanOutOptions,
    ) -> Self {
        Self {
            adapter,
            registry,
            metrics,
            in_flight: Semaphore::new(options.max_in_flight.max(1)),
            spacing: options.spacing,
        }
    }

    pub fn registry(&self) -> &LanguageRegistry {
        &self.registry
    }

    pub fn is_configured(&self) -> bool {
        self.adapter.is_configured()
    }

    /// Translate `text` into every enabled language not in `excluded`.
    ///
    /// Empty or whitespace-only text yields an empty map. Otherwise the map
    /// always holds `source → text`, and only that when the provider is
    /// unconfigured.
    pub async fn translate_to_all(
        &self,
        text: &str,
        source: &str,
        excluded: &HashSet<String>,
    ) -> BTreeMap<String, String> {
        let targets: Vec<&str> = self
            .registry
            .codes()
            .filter(|code| !excluded.contains(*code))
            .collect();

        self.translate_into(text, source, &targets).await
    }

    /// Translate `text` into exactly `targets` (plus the `source` identity entry).
    ///
    /// Targets whose call failed hold `text`.
    pub async fn translate_into(
        &self,
        text: &str,
        source: &str,
        targets: &[&str],
    ) -> BTreeMap<String, String> {
        self.fan_out(text, source, targets)
            .await
            .into_iter()
            .map(|(code, translated)| (code, translated.unwrap_or_else(|| text.to_string())))
            .collect()
    }

    /// Like [`translate_into`](Self::translate_into), but targets whose call
    /// failed are left out instead of holding `text`.
    pub async fn translate_into_verified(
        &self,
        text: &str,
        source: &str,
        targets: &[&str],
    ) -> BTreeMap<String, String> {
        self.fan_out(text, source, targets)
            .await
            .into_iter()
            .filter_map(|(code, translated)| translated.map(|value| (code, value)))
            .collect()
    }

    async fn fan_out(
        &self,
        text: &str,
        source: &str,
        targets: &[&str],
    ) -> BTreeMap<String, Option<String>> {
        let mut result = BTreeMap::new();
        if text.trim().is_empty() {
            return result;
        }

        result.insert(source.to_string(), Some(text.to_string()));

        if !self.adapter.is_configured() {
            self.metrics.record_unconfigured_skip();
            debug!("Translation provider unconfigured, keeping '{}' text only", source);
            return result;
        }

        let throttle = Throttle::new(self.spacing);
        let calls = targets
            .iter()
            .copied()
            .filter(|target| *target != source)
            .map(|target| {
                let throttle = &throttle;
                async move {
                    throttle.acquire().await;
                    // The semaphore is never closed, so acquire only fails on a bug
                    let _permit = self.in_flight.acquire().await.ok();
                    let translated = self.adapter.try_translate(text, target, source).await;
                    (target, translated)
                }
            });

        for (target, translated) in join_all(calls).await {
            result.insert(target.to_string(), translated);
        }

        result
    }
}
