//! Language registry: the set of languages content is translated into.
//!
//! The catalogue of known languages is static. A `LanguageRegistry` value
//! enables a configured subset of it and names the system default language.
//! It is built once at startup from configuration and passed to whoever needs
//! it; there is no global instance.

use thiserror::Error;

/// Metadata for a language the system knows how to handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageConfig {
    /// ISO 639-1 language code (e.g., "en", "es", "fr")
    pub code: &'static str,

    /// English name of the language (e.g., "English", "Spanish", "French")
    pub name: &'static str,

    /// Native name of the language (e.g., "English", "Español", "Français")
    pub native_name: &'static str,
}

/// Errors raised while building a registry from configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Unknown language code: '{0}'")]
    UnknownLanguage(String),

    #[error("Default language '{0}' is not among the supported languages")]
    DefaultNotEnabled(String),

    #[error("At least one supported language is required")]
    Empty,
}

/// Supported-language registry.
#[derive(Debug, Clone)]
pub struct LanguageRegistry {
    enabled: Vec<&'static LanguageConfig>,
    default: &'static LanguageConfig,
}

/// Code of the fallback language used when nothing else matches.
pub const SYSTEM_DEFAULT_LANGUAGE: &str = "en";

impl LanguageRegistry {
    /// Build a registry enabling `codes`, with `default_code` as the system default.
    ///
    /// Codes are trimmed and lowercased. Duplicates are ignored; order follows
    /// the first occurrence in `codes`.
    pub fn new<S: AsRef<str>>(codes: &[S], default_code: &str) -> Result<Self, RegistryError> {
        let mut enabled: Vec<&'static LanguageConfig> = Vec::with_capacity(codes.len());

        for raw in codes {
            let code = normalize_code(raw.as_ref());
            if code.is_empty() {
                continue;
            }
            let config = lookup(&code).ok_or_else(|| RegistryError::UnknownLanguage(code.clone()))?;
            if !enabled.iter().any(|lang| lang.code == config.code) {
                enabled.push(config);
            }
        }

        if enabled.is_empty() {
            return Err(RegistryError::Empty);
        }

        let default_code = normalize_code(default_code);
        let default = enabled
            .iter()
            .copied()
            .find(|lang| lang.code == default_code)
            .ok_or(RegistryError::DefaultNotEnabled(default_code))?;

        Ok(Self { enabled, default })
    }

    /// Get an enabled language configuration by its code.
    pub fn get_by_code(&self, code: &str) -> Option<&'static LanguageConfig> {
        self.enabled.iter().copied().find(|lang| lang.code == code)
    }

    /// All enabled languages, in configuration order.
    pub fn list_enabled(&self) -> &[&'static LanguageConfig] {
        &self.enabled
    }

    /// Codes of all enabled languages, in configuration order.
    pub fn codes(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.enabled.iter().map(|lang| lang.code)
    }

    /// The default language (used when neither the requested nor the base language matches).
    pub fn default_language(&self) -> &'static LanguageConfig {
        self.default
    }

    /// Check if a language code is supported and enabled.
    pub fn is_enabled(&self, code: &str) -> bool {
        self.get_by_code(code).is_some()
    }
}

impl Default for LanguageRegistry {
    /// Every known language enabled, English as default.
    fn default() -> Self {
        Self {
            enabled: KNOWN_LANGUAGES.iter().collect(),
            default: &KNOWN_LANGUAGES[0],
        }
    }
}

/// Find a language in the static catalogue, enabled or not.
pub fn lookup(code: &str) -> Option<&'static LanguageConfig> {
    KNOWN_LANGUAGES.iter().find(|lang| lang.code == code)
}

fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_lowercase()
}

// English must stay first: `Default` relies on it.
static KNOWN_LANGUAGES: [LanguageConfig; 20] = [
    LanguageConfig { code: "en", name: "English", native_name: "English" },
    LanguageConfig { code: "es", name: "Spanish", native_name: "Español" },
    LanguageConfig { code: "fr", name: "French", native_name: "Français" },
    LanguageConfig { code: "de", name: "German", native_name: "Deutsch" },
    LanguageConfig { code: "it", name: "Italian", native_name: "Italiano" },
    LanguageConfig { code: "pt", name: "Portuguese", native_name: "Português" },
    LanguageConfig { code: "nl", name: "Dutch", native_name: "Nederlands" },
    LanguageConfig { code: "ru", name: "Russian", native_name: "Русский" },
    LanguageConfig { code: "uk", name: "Ukrainian", native_name: "Українська" },
    LanguageConfig { code: "pl", name: "Polish", native_name: "Polski" },
    LanguageConfig { code: "tr", name: "Turkish", native_name: "Türkçe" },
    LanguageConfig { code: "ar", name: "Arabic", native_name: "العربية" },
    LanguageConfig { code: "he", name: "Hebrew", native_name: "עברית" },
    LanguageConfig { code: "hi", name: "Hindi", native_name: "हिन्दी" },
    LanguageConfig { code: "zh", name: "Chinese", native_name: "中文" },
    LanguageConfig { code: "ja", name: "Japanese", native_name: "日本語" },
    LanguageConfig { code: "ko", name: "Korean", native_name: "한국어" },
    LanguageConfig { code: "vi", name: "Vietnamese", native_name: "Tiếng Việt" },
    LanguageConfig { code: "id", name: "Indonesian", native_name: "Bahasa Indonesia" },
    LanguageConfig { code: "sv", name: "Swedish", native_name: "Svenska" },
];

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Construction Tests ====================

    #[test]
    fn test_new_enables_requested_languages_in_order() {
        let registry = LanguageRegistry::new(&["fr", "en", "es"], "en").unwrap();
        let codes: Vec<_> = registry.codes().collect();
        assert_eq!(codes, vec!["fr", "en", "es"]);
        assert_eq!(registry.default_language().code, "en");
    }

    #[test]
    fn test_new_normalizes_and_dedupes_codes() {
        let registry = LanguageRegistry::new(&[" EN ", "es", "en", ""], "EN").unwrap();
        let codes: Vec<_> = registry.codes().collect();
        assert_eq!(codes, vec!["en", "es"]);
    }

    #[test]
    fn test_new_rejects_unknown_code() {
        let result = LanguageRegistry::new(&["en", "xx"], "en");
        assert_eq!(
            result.unwrap_err(),
            RegistryError::UnknownLanguage("xx".to_string())
        );
    }

    #[test]
    fn test_new_rejects_default_outside_enabled_set() {
        let result = LanguageRegistry::new(&["es", "fr"], "en");
        assert_eq!(
            result.unwrap_err(),
            RegistryError::DefaultNotEnabled("en".to_string())
        );
    }

    #[test]
    fn test_new_rejects_empty_list() {
        let codes: [&str; 0] = [];
        assert_eq!(
            LanguageRegistry::new(&codes, "en").unwrap_err(),
            RegistryError::Empty
        );
    }

    // ==================== Lookup Tests ====================

    #[test]
    fn test_default_registry_has_full_catalogue() {
        let registry = LanguageRegistry::default();
        assert_eq!(registry.list_enabled().len(), 20);
        assert_eq!(registry.default_language().code, SYSTEM_DEFAULT_LANGUAGE);
    }

    #[test]
    fn test_get_by_code_spanish() {
        let registry = LanguageRegistry::default();
        let config = registry.get_by_code("es").unwrap();
        assert_eq!(config.name, "Spanish");
        assert_eq!(config.native_name, "Español");
    }

    #[test]
    fn test_is_enabled_respects_subset() {
        let registry = LanguageRegistry::new(&["en", "es"], "en").unwrap();
        assert!(registry.is_enabled("es"));
        assert!(!registry.is_enabled("fr"));
        assert!(lookup("fr").is_some());
    }
}
