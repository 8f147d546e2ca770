use crate::record::{ContentRecord, TranslatableFields};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// A record as served to a reader: attributes plus the fields of one language.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalizedView {
    pub id: String,

    #[serde(flatten)]
    pub attributes: Map<String, Value>,

    #[serde(flatten)]
    pub fields: TranslatableFields,

    pub base_language: String,

    /// Sorted union of the table's languages and the base language
    pub available_languages: Vec<String>,

    /// The language actually served, which may differ from the one requested
    pub current_language: String,
}

/// Pick the best language entry of `record` for `requested`.
///
/// Lookup order: the requested code, its primary subtag (`pt` for `pt-BR`),
/// the record's base language, `default_language`, and finally the record's
/// raw fields, reported as the base language. The record is not modified.
pub fn resolve(record: &ContentRecord, requested: &str, default_language: &str) -> LocalizedView {
    let requested = requested.trim().to_ascii_lowercase();
    let primary = requested
        .split(|c: char| c == '-' || c == '_')
        .next()
        .unwrap_or_default()
        .to_string();

    let candidates = [
        requested.as_str(),
        primary.as_str(),
        record.base_language.as_str(),
        default_language,
    ];

    let (current_language, fields) = candidates
        .iter()
        .filter(|code| !code.is_empty())
        .find_map(|code| record.translations.get_key_value(*code))
        .map(|(code, fields)| (code.clone(), fields.clone()))
        .unwrap_or_else(|| (record.base_language.clone(), record.fields.clone()));

    let mut available: BTreeSet<String> = record.translations.keys().cloned().collect();
    available.insert(record.base_language.clone());

    LocalizedView {
        id: record.id.clone(),
        attributes: record.attributes.clone(),
        fields,
        base_language: record.base_language.clone(),
        available_languages: available.into_iter().collect(),
        current_language,
    }
}
