//! Content records and their translation tables.
//!
//! A record is authored in one base language. Its translatable fields are
//! copied per language into a translation table that is stored next to the
//! record as a JSON column. Rows coming back from the store go through
//! [`decode_stored`], the one place that deals with malformed columns.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::warn;

/// Kind of a content block. Only `text` content is ever translated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BlockKind {
    Text,
    Image,
    /// Any other kind; kept verbatim and treated like an opaque reference.
    Other(String),
}

impl BlockKind {
    pub fn is_text(&self) -> bool {
        matches!(self, BlockKind::Text)
    }
}

impl From<String> for BlockKind {
    fn from(kind: String) -> Self {
        match kind.as_str() {
            "text" => BlockKind::Text,
            "image" => BlockKind::Image,
            _ => BlockKind::Other(kind),
        }
    }
}

impl From<BlockKind> for String {
    fn from(kind: BlockKind) -> Self {
        match kind {
            BlockKind::Text => "text".to_string(),
            BlockKind::Image => "image".to_string(),
            BlockKind::Other(kind) => kind,
        }
    }
}

/// A typed content unit: a lesson statement or one answer option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: BlockKind,

    /// Literal text for `text` blocks, an opaque reference (URL) otherwise
    #[serde(default)]
    pub content: String,

    /// Always translatable, whatever the kind
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ContentBlock {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::Text,
            content: content.into(),
            description: None,
        }
    }

    pub fn image(url: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::Image,
            content: url.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// The translatable part of a record.
///
/// Generic records only carry `title` and `description`; lessons add a
/// `statement` and answer `options`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslatableFields {
    #[serde(default)]
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statement: Option<ContentBlock>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<ContentBlock>>,
}

/// Minimum number of answer options a lesson must carry.
pub const MIN_OPTIONS: usize = 2;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FieldsError {
    #[error("A lesson needs at least 2 options, got {0}")]
    TooFewOptions(usize),
}

impl TranslatableFields {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Check the lesson business rule on `options`, when options are present.
    pub fn validate_options(&self) -> Result<(), FieldsError> {
        match &self.options {
            Some(options) if options.len() < MIN_OPTIONS => {
                Err(FieldsError::TooFewOptions(options.len()))
            }
            _ => Ok(()),
        }
    }
}

/// Language code → fully translated copy of the translatable fields.
pub type TranslationTable = BTreeMap<String, TranslatableFields>;

/// A record together with its cached translations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRecord {
    pub id: String,
    pub base_language: String,
    pub fields: TranslatableFields,

    #[serde(default)]
    pub translations: TranslationTable,

    /// Non-translatable attributes, passed through untouched
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,
}

/// Outcome of decoding a stored row.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedRecord {
    /// Every column decoded cleanly.
    Parsed(ContentRecord),
    /// Some columns were malformed and replaced by empty defaults.
    Fallback {
        record: ContentRecord,
        problems: Vec<String>,
    },
}

impl DecodedRecord {
    pub fn record(&self) -> &ContentRecord {
        match self {
            DecodedRecord::Parsed(record) => record,
            DecodedRecord::Fallback { record, .. } => record,
        }
    }

    pub fn into_record(self) -> ContentRecord {
        match self {
            DecodedRecord::Parsed(record) => record,
            DecodedRecord::Fallback { record, .. } => record,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, DecodedRecord::Fallback { .. })
    }
}

/// Decode a row as the CRUD layer stores it.
///
/// The row is a flat JSON object: `id`, `baseLanguage`, `title`,
/// `description`, and the JSON columns `statement`, `options` and
/// `translations`, each of which may arrive as a JSON string or as an already
/// parsed value. Every other key is kept as a non-translatable attribute.
///
/// Never fails. A malformed `translations` column decodes to an empty table,
/// a malformed `statement` or `options` column to an absent field, and a
/// missing `baseLanguage` to `default_language`.
pub fn decode_stored(raw: Value, default_language: &str) -> DecodedRecord {
    let mut problems = Vec::new();

    let mut columns = match raw {
        Value::Object(map) => map,
        other => {
            problems.push(format!("row is not a JSON object ({})", json_kind(&other)));
            Map::new()
        }
    };

    let id = match columns.remove("id") {
        Some(Value::String(id)) => id,
        Some(Value::Number(id)) => id.to_string(),
        None | Some(Value::Null) => String::new(),
        Some(other) => {
            problems.push(format!("id has unexpected type {}", json_kind(&other)));
            String::new()
        }
    };

    let base_language = take_string(&mut columns, "baseLanguage", &mut problems)
        .map(|code| code.trim().to_ascii_lowercase())
        .filter(|code| !code.is_empty())
        .unwrap_or_else(|| default_language.to_string());

    let fields = TranslatableFields {
        title: take_string(&mut columns, "title", &mut problems).unwrap_or_default(),
        description: take_string(&mut columns, "description", &mut problems),
        statement: decode_column(columns.remove("statement"), "statement", &mut problems),
        options: decode_column(columns.remove("options"), "options", &mut problems),
    };

    let translations: TranslationTable =
        decode_column(columns.remove("translations"), "translations", &mut problems)
            .unwrap_or_default();

    let record = ContentRecord {
        id,
        base_language,
        fields,
        translations,
        attributes: columns,
    };

    if problems.is_empty() {
        DecodedRecord::Parsed(record)
    } else {
        warn!(
            "Stored record '{}' decoded with fallbacks: {}",
            record.id,
            problems.join("; ")
        );
        DecodedRecord::Fallback { record, problems }
    }
}

fn take_string(
    columns: &mut Map<String, Value>,
    key: &str,
    problems: &mut Vec<String>,
) -> Option<String> {
    match columns.remove(key) {
        Some(Value::String(value)) => Some(value),
        None | Some(Value::Null) => None,
        Some(other) => {
            problems.push(format!("{} has unexpected type {}", key, json_kind(&other)));
            None
        }
    }
}

fn decode_column<T: DeserializeOwned>(
    value: Option<Value>,
    name: &str,
    problems: &mut Vec<String>,
) -> Option<T> {
    let result = match value {
        None | Some(Value::Null) => return None,
        Some(Value::String(text)) if text.trim().is_empty() => return None,
        Some(Value::String(text)) => serde_json::from_str(&text),
        Some(other) => serde_json::from_value(other),
    };

    match result {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            problems.push(format!("{} column is malformed: {}", name, e));
            None
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
