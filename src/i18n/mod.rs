//! Internationalization (i18n) support shared by the translation pipeline.
//!
//! - `registry`: the supported-language catalogue and the enabled subset
//! - `validator`: translation quality checks run on provider output
//! - `metrics`: translation and cache counters
//!
//! ```rust,ignore
//! use content_localizer::i18n::LanguageRegistry;
//!
//! let registry = LanguageRegistry::new(&["en", "es", "fr"], "en")?;
//! assert!(registry.is_enabled("fr"));
//! ```

mod metrics;
mod registry;
mod validator;

pub use metrics::{MetricsReport, TranslationMetrics};
pub use registry::{
    lookup, LanguageConfig, LanguageRegistry, RegistryError, SYSTEM_DEFAULT_LANGUAGE,
};
pub use validator::{TranslationValidator, ValidationReport};
