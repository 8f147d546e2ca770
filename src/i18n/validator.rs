//! Translation quality validation module.
//!
//! Checks that a provider's output keeps the parts of lesson content that
//! must never be translated: URLs, `{placeholder}` tokens and markdown links.
//! An empty translation of a non-empty source is an error; the adapter treats
//! it as a failed call.

use regex::Regex;
use std::sync::OnceLock;

/// Validation report containing errors and warnings about a translation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationReport {
    /// Critical errors; the translation must not be used
    pub errors: Vec<String>,

    /// Non-critical warnings about potential issues
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Check if the report is clean (no errors or warnings)
    pub fn is_clean(&self) -> bool {
        !self.has_errors() && !self.has_warnings()
    }
}

/// Validator for translation quality.
pub struct TranslationValidator;

// Regex patterns for extraction (cached for performance)
static URL_REGEX: OnceLock<Regex> = OnceLock::new();
static PLACEHOLDER_REGEX: OnceLock<Regex> = OnceLock::new();
static MARKDOWN_LINK_REGEX: OnceLock<Regex> = OnceLock::new();

impl TranslationValidator {
    /// Validate a translation against its source text.
    pub fn validate(original: &str, translated: &str) -> ValidationReport {
        let mut report = ValidationReport::new();

        if !original.trim().is_empty() && translated.trim().is_empty() {
            report
                .errors
                .push("Translation is empty for non-empty source text".to_string());
            return report;
        }

        let orig_urls = Self::extract_urls(original);
        let trans_urls = Self::extract_urls(translated);
        if orig_urls != trans_urls {
            report.warnings.push(format!(
                "URL mismatch: original has {} URLs, translation has {} URLs",
                orig_urls.len(),
                trans_urls.len()
            ));
        }

        let mut orig_placeholders = Self::extract_placeholders(original);
        let mut trans_placeholders = Self::extract_placeholders(translated);
        // Word order changes between languages, so only the multiset matters
        orig_placeholders.sort();
        trans_placeholders.sort();
        if orig_placeholders != trans_placeholders {
            report.warnings.push(format!(
                "Placeholder mismatch: original has {:?}, translation has {:?}",
                orig_placeholders, trans_placeholders
            ));
        }

        let orig_md_links = Self::extract_markdown_links(original);
        let trans_md_links = Self::extract_markdown_links(translated);
        if orig_md_links.len() != trans_md_links.len() {
            report.warnings.push(format!(
                "Markdown link count mismatch: original has {}, translation has {}",
                orig_md_links.len(),
                trans_md_links.len()
            ));
        }

        report
    }

    /// Extract all URLs from text
    fn extract_urls(text: &str) -> Vec<String> {
        let regex = URL_REGEX.get_or_init(|| Regex::new(r"https?://[^\s)\]]+").unwrap());

        regex
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// Extract `{name}` and `{{name}}` placeholders from text
    fn extract_placeholders(text: &str) -> Vec<String> {
        let regex = PLACEHOLDER_REGEX
            .get_or_init(|| Regex::new(r"\{\{?\s*[a-zA-Z0-9_.]+\s*\}\}?").unwrap());

        regex
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// Extract markdown links from text (approximate)
    fn extract_markdown_links(text: &str) -> Vec<String> {
        let regex =
            MARKDOWN_LINK_REGEX.get_or_init(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").unwrap());

        regex
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }
}
