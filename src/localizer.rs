//! Entry point for the CRUD layer: create, edit and read localized records.

use crate::assembler::{identity_table, ContentAssembler};
use crate::config::Config;
use crate::i18n::{LanguageRegistry, MetricsReport, TranslationMetrics};
use crate::policy::{self, CacheDecision, SkipReason, SkippedLanguage};
use crate::provider::{GoogleTranslateProvider, TranslationProvider};
use crate::record::{
    decode_stored, ContentRecord, FieldsError, TranslatableFields, TranslationTable,
};
use crate::resolver::{self, LocalizedView};
use crate::translation::{FanOutOptions, FanOutTranslator, TranslationAdapter, DEFAULT_CALL_TIMEOUT};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Request errors. Provider failures never surface here.
#[derive(Debug, Error)]
pub enum LocalizeError {
    #[error("Unsupported base language: '{0}'")]
    UnsupportedLanguage(String),

    #[error(transparent)]
    InvalidFields(#[from] FieldsError),
}

/// A new record's translatable content.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    pub fields: TranslatableFields,
    /// Defaults to the system default language
    #[serde(default)]
    pub base_language: Option<String>,
    #[serde(default)]
    pub auto_translate: Option<bool>,
}

impl CreateRequest {
    /// Load a request from a JSON file holding `fields` and `baseLanguage`.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }
}

/// An edit of a stored record.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    /// Fields as currently stored
    pub previous_fields: TranslatableFields,
    /// Base language as currently stored
    pub base_language: String,
    #[serde(default)]
    pub translations: TranslationTable,

    /// Fields after the edit
    pub fields: TranslatableFields,
    /// Set when the edit changes the base language
    #[serde(default)]
    pub new_base_language: Option<String>,
    #[serde(default)]
    pub auto_translate: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddLanguagesRequest {
    pub fields: TranslatableFields,
    pub base_language: String,
    #[serde(default)]
    pub translations: TranslationTable,
    pub target_languages: Vec<String>,
}

/// The table to persist after a create or an update.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationOutcome {
    pub base_language: String,
    pub translations: TranslationTable,
    pub decision: CacheDecision,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddLanguagesOutcome {
    pub translations: TranslationTable,
    pub added: Vec<String>,
    pub skipped: Vec<SkippedLanguage>,
}

/// Runtime knobs for the fan-out pool and the provider calls.
#[derive(Debug, Clone)]
pub struct LocalizerOptions {
    pub fan_out: FanOutOptions,
    pub call_timeout: Duration,
}

impl Default for LocalizerOptions {
    fn default() -> Self {
        Self {
            fan_out: FanOutOptions::default(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}

/// Built once at startup and shared by `Arc`.
pub struct Localizer {
    registry: Arc<LanguageRegistry>,
    assembler: ContentAssembler,
    metrics: Arc<TranslationMetrics>,
}

impl Localizer {
    pub fn new(
        registry: LanguageRegistry,
        provider: Arc<dyn TranslationProvider>,
        options: LocalizerOptions,
    ) -> Self {
        let registry = Arc::new(registry);
        let metrics = Arc::new(TranslationMetrics::new());
        let adapter = TranslationAdapter::new(provider, Arc::clone(&metrics))
            .with_timeout(options.call_timeout);
        let translator = FanOutTranslator::new(
            adapter,
            Arc::clone(&registry),
            Arc::clone(&metrics),
            options.fan_out,
        );

        Self {
            registry,
            assembler: ContentAssembler::new(translator),
            metrics,
        }
    }

    /// Build the Google-backed localizer described by `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let registry = config.language_registry()?;

        let client = reqwest::Client::builder()
            .timeout(config.call_timeout())
            .build()
            .context("Failed to build HTTP client")?;
        let provider = GoogleTranslateProvider::new(
            client,
            config.translate_api_url.clone(),
            config.translate_api_key.clone(),
        );

        if !provider.is_configured() {
            warn!("TRANSLATE_API_KEY not set, content will be stored untranslated");
        }

        let options = LocalizerOptions {
            fan_out: FanOutOptions {
                max_in_flight: config.max_in_flight,
                spacing: config.stagger(),
            },
            call_timeout: config.call_timeout(),
        };

        Ok(Self::new(registry, Arc::new(provider), options))
    }

    pub fn registry(&self) -> &LanguageRegistry {
        &self.registry
    }

    pub fn metrics(&self) -> MetricsReport {
        self.metrics.report()
    }

    /// Compute the table for a new record.
    pub async fn create(
        &self,
        request: CreateRequest,
    ) -> Result<TranslationOutcome, LocalizeError> {
        let base = self.base_language(request.base_language.as_deref())?;
        request.fields.validate_options()?;

        let decision = policy::decide_create(request.auto_translate);
        let translations = match decision {
            CacheDecision::Regenerate => {
                self.metrics.record_table_regeneration();
                self.assembler
                    .build_translations(&request.fields, &base, true)
                    .await
            }
            CacheDecision::BaseEntryOnly | CacheDecision::Reuse => {
                identity_table(&request.fields, &base)
            }
        };

        info!(
            "Created translations from '{}' ({:?}, {} languages)",
            base,
            decision,
            translations.len()
        );

        Ok(TranslationOutcome {
            base_language: base,
            translations,
            decision,
        })
    }

    /// Compute the table after an edit.
    pub async fn update(
        &self,
        request: UpdateRequest,
    ) -> Result<TranslationOutcome, LocalizeError> {
        let UpdateRequest {
            previous_fields,
            base_language,
            translations: existing,
            fields,
            new_base_language,
            auto_translate,
        } = request;

        let previous_base = normalize(&base_language);
        let base = match new_base_language {
            Some(code) => self.base_language(Some(&code))?,
            None => previous_base.clone(),
        };
        fields.validate_options()?;

        let decision =
            policy::decide_update(&previous_fields, &previous_base, &fields, &base, auto_translate);

        let translations = match decision {
            CacheDecision::Reuse => {
                self.metrics.record_table_reuse();
                let mut table = existing;
                // Tables recovered from a malformed column may lack the base entry
                table.entry(base.clone()).or_insert_with(|| fields.clone());
                table
            }
            CacheDecision::BaseEntryOnly => {
                let mut table = existing;
                table.insert(base.clone(), fields.clone());
                table
            }
            CacheDecision::Regenerate => {
                self.metrics.record_table_regeneration();
                let fresh = self.assembler.build_translations(&fields, &base, true).await;
                policy::merge_tables(existing, fresh)
            }
        };

        info!(
            "Updated translations for '{}' ({:?}, {} languages)",
            base,
            decision,
            translations.len()
        );

        Ok(TranslationOutcome {
            base_language: base,
            translations,
            decision,
        })
    }

    /// Translate an existing record into additional languages.
    ///
    /// Entries already in the table are returned untouched.
    pub async fn add_languages(&self, request: AddLanguagesRequest) -> AddLanguagesOutcome {
        let base = normalize(&request.base_language);
        let plan = policy::plan_add_languages(
            &self.registry,
            &request.translations,
            &base,
            &request.target_languages,
        );

        let mut translations = request.translations;
        let mut skipped = plan.skipped;
        let mut added = Vec::new();

        if !plan.missing.is_empty() {
            let fresh = self
                .assembler
                .translate_missing(&request.fields, &base, &plan.missing)
                .await;

            for code in plan.missing {
                match fresh.get(code) {
                    Some(entry) => {
                        translations.insert(code.to_string(), entry.clone());
                        added.push(code.to_string());
                    }
                    None => skipped.push(SkippedLanguage {
                        code: code.to_string(),
                        reason: SkipReason::Untranslated,
                    }),
                }
            }
        }

        info!(
            "Added {} languages, skipped {}",
            added.len(),
            skipped.len()
        );

        AddLanguagesOutcome {
            translations,
            added,
            skipped,
        }
    }

    pub fn resolve(&self, record: &ContentRecord, requested: &str) -> LocalizedView {
        resolver::resolve(record, requested, self.registry.default_language().code)
    }

    /// Decode a row as stored by the CRUD layer and resolve it.
    pub fn resolve_stored(&self, raw: Value, requested: &str) -> LocalizedView {
        let default_language = self.registry.default_language().code;
        let record = decode_stored(raw, default_language).into_record();
        resolver::resolve(&record, requested, default_language)
    }

    fn base_language(&self, requested: Option<&str>) -> Result<String, LocalizeError> {
        let Some(code) = requested.map(normalize).filter(|code| !code.is_empty()) else {
            return Ok(self.registry.default_language().code.to_string());
        };

        match self.registry.get_by_code(&code) {
            Some(language) => Ok(language.code.to_string()),
            None => Err(LocalizeError::UnsupportedLanguage(code)),
        }
    }
}

fn normalize(code: &str) -> String {
    code.trim().to_ascii_lowercase()
}
