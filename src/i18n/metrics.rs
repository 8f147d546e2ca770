//! Translation metrics and observability module.
//!
//! Counters for provider traffic and translation-table cache decisions. A
//! `TranslationMetrics` is owned by the `Localizer` and shared by `Arc` with
//! the components that record into it.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Translation counters.
#[derive(Debug, Default)]
pub struct TranslationMetrics {
    /// Number of calls issued to the translation provider
    provider_calls: AtomicUsize,

    /// Number of provider calls that failed or timed out
    provider_failures: AtomicUsize,

    /// Number of leaf texts that fell back to their source text
    fallbacks: AtomicUsize,

    /// Number of fan-outs skipped because the provider is unconfigured
    unconfigured_skips: AtomicUsize,

    /// Number of updates that reused the stored translation table
    table_reuses: AtomicUsize,

    /// Number of times a translation table was (re)generated through the provider
    table_regenerations: AtomicUsize,
}

impl TranslationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_provider_call(&self) {
        self.provider_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_provider_failure(&self) {
        self.provider_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fallback(&self) {
        self.fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unconfigured_skip(&self) {
        self.unconfigured_skips.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_table_reuse(&self) {
        self.table_reuses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_table_regeneration(&self) {
        self.table_regenerations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn provider_calls(&self) -> usize {
        self.provider_calls.load(Ordering::Relaxed)
    }

    pub fn provider_failures(&self) -> usize {
        self.provider_failures.load(Ordering::Relaxed)
    }

    pub fn fallbacks(&self) -> usize {
        self.fallbacks.load(Ordering::Relaxed)
    }

    pub fn unconfigured_skips(&self) -> usize {
        self.unconfigured_skips.load(Ordering::Relaxed)
    }

    pub fn table_reuses(&self) -> usize {
        self.table_reuses.load(Ordering::Relaxed)
    }

    pub fn table_regenerations(&self) -> usize {
        self.table_regenerations.load(Ordering::Relaxed)
    }

    /// Generate a metrics report.
    pub fn report(&self) -> MetricsReport {
        let calls = self.provider_calls();
        let failures = self.provider_failures();
        let provider_success_rate = if calls > 0 {
            (calls.saturating_sub(failures) as f64 / calls as f64) * 100.0
        } else {
            0.0
        };

        let reuses = self.table_reuses();
        let regenerations = self.table_regenerations();
        let decisions = reuses + regenerations;
        let table_reuse_rate = if decisions > 0 {
            (reuses as f64 / decisions as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            provider_calls: calls,
            provider_failures: failures,
            provider_success_rate,
            fallbacks: self.fallbacks(),
            unconfigured_skips: self.unconfigured_skips(),
            table_reuses: reuses,
            table_regenerations: regenerations,
            table_reuse_rate,
        }
    }
}

/// Snapshot of the translation counters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsReport {
    pub provider_calls: usize,
    pub provider_failures: usize,

    /// Provider success rate as a percentage (0-100)
    pub provider_success_rate: f64,

    pub fallbacks: usize,
    pub unconfigured_skips: usize,
    pub table_reuses: usize,
    pub table_regenerations: usize,

    /// Share of update decisions served from the stored table, as a percentage (0-100)
    pub table_reuse_rate: f64,
}
