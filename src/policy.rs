//! When a stored translation table is reused and when it is rebuilt.
//!
//! Tables never expire with time. They change only on create, on edits of the
//! translatable fields or base language, and on explicit add-language requests.

use crate::i18n::LanguageRegistry;
use crate::record::{TranslatableFields, TranslationTable};
use serde::Serialize;

/// What to do with a record's translation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CacheDecision {
    /// Translate every field into every supported language
    Regenerate,
    /// Write the authored text under the base language only
    BaseEntryOnly,
    /// Keep the stored table as it is
    Reuse,
}

/// Decision for a new record.
pub fn decide_create(auto_translate: Option<bool>) -> CacheDecision {
    match auto_translate {
        Some(false) => CacheDecision::BaseEntryOnly,
        _ => CacheDecision::Regenerate,
    }
}

/// Decision for an edit of an existing record.
///
/// An unchanged edit reuses the table unless `auto_translate` is `Some(true)`.
/// An omitted `auto_translate` regenerates the whole table as soon as any
/// translatable field or the base language changed, even if only one field
/// did.
pub fn decide_update(
    previous_fields: &TranslatableFields,
    previous_base: &str,
    fields: &TranslatableFields,
    base: &str,
    auto_translate: Option<bool>,
) -> CacheDecision {
    let changed = previous_fields != fields || previous_base != base;

    match auto_translate {
        Some(true) => CacheDecision::Regenerate,
        _ if !changed => CacheDecision::Reuse,
        Some(false) => CacheDecision::BaseEntryOnly,
        None => CacheDecision::Regenerate,
    }
}

/// `{...existing, ...fresh}`: fresh entries win, other languages are kept.
pub fn merge_tables(existing: TranslationTable, fresh: TranslationTable) -> TranslationTable {
    let mut merged = existing;
    merged.extend(fresh);
    merged
}

/// Why a requested language was not added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SkipReason {
    /// Not among the enabled languages
    Unsupported,
    /// The table already has an entry for it
    AlreadyPresent,
    /// It is the record's own language
    BaseLanguage,
    /// Not every text was translated (provider unconfigured or failing, or
    /// nothing to translate); a later request can still add it
    Untranslated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedLanguage {
    pub code: String,
    pub reason: SkipReason,
}

/// Languages an add-language request should translate into.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddLanguagesPlan {
    pub missing: Vec<&'static str>,
    pub skipped: Vec<SkippedLanguage>,
}

/// Split `requested` into languages to translate and languages to skip.
///
/// Existing entries are never touched, so a language is only planned when it
/// is enabled, absent from the table, and not the base language.
pub fn plan_add_languages<S: AsRef<str>>(
    registry: &LanguageRegistry,
    existing: &TranslationTable,
    base: &str,
    requested: &[S],
) -> AddLanguagesPlan {
    let mut plan = AddLanguagesPlan::default();

    for raw in requested {
        let code = raw.as_ref().trim().to_ascii_lowercase();
        if plan.missing.iter().any(|planned| *planned == code)
            || plan.skipped.iter().any(|skipped| skipped.code == code)
        {
            continue;
        }

        let reason = match registry.get_by_code(&code) {
            None => Some(SkipReason::Unsupported),
            Some(_) if code == base => Some(SkipReason::BaseLanguage),
            Some(_) if existing.contains_key(&code) => Some(SkipReason::AlreadyPresent),
            Some(language) => {
                plan.missing.push(language.code);
                None
            }
        };

        if let Some(reason) = reason {
            plan.skipped.push(SkippedLanguage { code, reason });
        }
    }

    plan
}
