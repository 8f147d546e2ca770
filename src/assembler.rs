//! Builds translation tables for whole records.
//!
//! A record's translatable text lives in a handful of leaves: the title, the
//! description, and the content and description of the statement and of every
//! option. Each non-empty leaf is fanned out to the supported languages and
//! the results are folded back into one full copy of the fields per language.

use crate::record::{TranslatableFields, TranslationTable};
use crate::translation::FanOutTranslator;
use futures::future::join_all;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, info};

/// A translatable position inside [`TranslatableFields`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Leaf {
    Title,
    Description,
    StatementContent,
    StatementDescription,
    OptionContent(usize),
    OptionDescription(usize),
}

/// Leaves holding text worth translating, in document order.
///
/// Block content is only text when the block kind is `text`; image references
/// and other kinds are never sent to the provider.
fn text_leaves(fields: &TranslatableFields) -> Vec<(Leaf, &str)> {
    let mut leaves = vec![(Leaf::Title, fields.title.as_str())];

    if let Some(description) = &fields.description {
        leaves.push((Leaf::Description, description.as_str()));
    }

    if let Some(statement) = &fields.statement {
        if statement.kind.is_text() {
            leaves.push((Leaf::StatementContent, statement.content.as_str()));
        }
        if let Some(description) = &statement.description {
            leaves.push((Leaf::StatementDescription, description.as_str()));
        }
    }

    if let Some(options) = &fields.options {
        for (index, option) in options.iter().enumerate() {
            if option.kind.is_text() {
                leaves.push((Leaf::OptionContent(index), option.content.as_str()));
            }
            if let Some(description) = &option.description {
                leaves.push((Leaf::OptionDescription(index), description.as_str()));
            }
        }
    }

    leaves.retain(|(_, text)| !text.trim().is_empty());
    leaves
}

fn set_leaf(fields: &mut TranslatableFields, leaf: Leaf, text: String) {
    match leaf {
        Leaf::Title => fields.title = text,
        Leaf::Description => fields.description = Some(text),
        Leaf::StatementContent => {
            if let Some(statement) = fields.statement.as_mut() {
                statement.content = text;
            }
        }
        Leaf::StatementDescription => {
            if let Some(statement) = fields.statement.as_mut() {
                statement.description = Some(text);
            }
        }
        Leaf::OptionContent(index) => {
            if let Some(option) = fields.options.as_mut().and_then(|o| o.get_mut(index)) {
                option.content = text;
            }
        }
        Leaf::OptionDescription(index) => {
            if let Some(option) = fields.options.as_mut().and_then(|o| o.get_mut(index)) {
                option.description = Some(text);
            }
        }
    }
}

/// The table holding only the authored text.
pub fn identity_table(fields: &TranslatableFields, source: &str) -> TranslationTable {
    let mut table = TranslationTable::new();
    table.insert(source.to_string(), fields.clone());
    table
}

/// Turns authored fields into per-language translation tables.
pub struct ContentAssembler {
    translator: FanOutTranslator,
}

impl ContentAssembler {
    pub fn new(translator: FanOutTranslator) -> Self {
        Self { translator }
    }

    /// Build the translation table of `fields` authored in `source`.
    ///
    /// With `auto_translate == false` the provider is not consulted and the
    /// table holds exactly `{source: fields}`. In every case
    /// `table[source] == fields`.
    pub async fn build_translations(
        &self,
        fields: &TranslatableFields,
        source: &str,
        auto_translate: bool,
    ) -> TranslationTable {
        if !auto_translate {
            debug!("Auto-translate disabled, recording '{}' text as authored", source);
            return identity_table(fields, source);
        }

        let targets: Vec<&str> = self.translator.registry().codes().collect();
        let table = self.assemble(fields, source, &targets, false).await;

        info!(
            "Built translation table from '{}' with {} languages",
            source,
            table.len()
        );
        table
    }

    /// Translate `fields` into `languages` only.
    ///
    /// Returns entries only for listed languages in which the provider
    /// translated every leaf. A language with any failed call, or a record with
    /// no text at all, gets no entry. The source entry is never part of the
    /// result.
    pub async fn translate_missing(
        &self,
        fields: &TranslatableFields,
        source: &str,
        languages: &[&str],
    ) -> TranslationTable {
        let mut table = self.assemble(fields, source, languages, true).await;
        table.retain(|code, _| {
            code != source && languages.iter().any(|lang| *lang == code.as_str())
        });
        table
    }

    /// With `complete_only`, languages missing a translation for any leaf are
    /// dropped instead of falling back to the source value.
    async fn assemble(
        &self,
        fields: &TranslatableFields,
        source: &str,
        targets: &[&str],
        complete_only: bool,
    ) -> TranslationTable {
        let leaves = text_leaves(fields);

        // Identical texts (e.g. repeated option labels) are translated once
        let mut unique_texts: Vec<&str> = Vec::new();
        let mut text_index: HashMap<&str, usize> = HashMap::new();
        for (_, text) in &leaves {
            text_index.entry(*text).or_insert_with(|| {
                unique_texts.push(*text);
                unique_texts.len() - 1
            });
        }

        let translated: Vec<BTreeMap<String, String>> =
            join_all(unique_texts.iter().map(|text| async move {
                if complete_only {
                    self.translator
                        .translate_into_verified(text, source, targets)
                        .await
                } else {
                    self.translator.translate_into(text, source, targets).await
                }
            }))
            .await;

        let mut languages: BTreeSet<&str> = translated
            .iter()
            .flat_map(|per_language| per_language.keys().map(String::as_str))
            .collect();
        if complete_only {
            languages.retain(|language| {
                translated
                    .iter()
                    .all(|per_language| per_language.contains_key(*language))
            });
        }
        languages.insert(source);

        let mut table = TranslationTable::new();
        for language in languages {
            if language == source {
                continue;
            }

            let mut entry = fields.clone();
            for (leaf, text) in &leaves {
                // Leaves without a translation for this language keep their source value
                if let Some(value) = translated[text_index[text]].get(language) {
                    set_leaf(&mut entry, *leaf, value.clone());
                }
            }
            table.insert(language.to_string(), entry);
        }

        table.insert(source.to_string(), fields.clone());
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::{LanguageRegistry, TranslationMetrics};
    use crate::provider::{NoopProvider, ProviderError, TranslationProvider};
    use crate::record::{BlockKind, ContentBlock};
    use crate::translation::{FanOutOptions, TranslationAdapter};
    use async_trait::async_trait;
    use proptest::prelude::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    // ==================== Helper Functions ====================

    /// Looks translations up in a fixed dictionary; unknown entries fail.
    struct DictionaryProvider {
        entries: HashMap<(String, String), String>,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl DictionaryProvider {
        fn new(entries: &[(&str, &str, &str)]) -> Self {
            Self {
                entries: entries
                    .iter()
                    .map(|(text, target, value)| {
                        ((text.to_string(), target.to_string()), value.to_string())
                    })
                    .collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn texts_sent(&self) -> Vec<String> {
            self.calls.lock().unwrap().iter().map(|(text, _)| text.clone()).collect()
        }
    }

    #[async_trait]
    impl TranslationProvider for DictionaryProvider {
        fn name(&self) -> &str {
            "dictionary"
        }

        fn is_configured(&self) -> bool {
            true
        }

        async fn translate(
            &self,
            text: &str,
            target: &str,
            _source: &str,
        ) -> Result<String, ProviderError> {
            self.calls
                .lock()
                .unwrap()
                .push((text.to_string(), target.to_string()));
            self.entries
                .get(&(text.to_string(), target.to_string()))
                .cloned()
                .ok_or_else(|| ProviderError::Malformed(format!("no entry for {}", text)))
        }
    }

    /// Deterministic provider for property tests.
    struct TaggingProvider;

    #[async_trait]
    impl TranslationProvider for TaggingProvider {
        fn name(&self) -> &str {
            "tagging"
        }

        fn is_configured(&self) -> bool {
            true
        }

        async fn translate(
            &self,
            text: &str,
            target: &str,
            _: &str,
        ) -> Result<String, ProviderError> {
            Ok(format!("{}:{}", target, text))
        }
    }

    fn assembler(provider: Arc<dyn TranslationProvider>, codes: &[&str]) -> ContentAssembler {
        let metrics = Arc::new(TranslationMetrics::new());
        let registry = Arc::new(LanguageRegistry::new(codes, "en").unwrap());
        let adapter = TranslationAdapter::new(provider, Arc::clone(&metrics));
        let options = FanOutOptions {
            max_in_flight: 4,
            spacing: Duration::ZERO,
        };
        ContentAssembler::new(FanOutTranslator::new(adapter, registry, metrics, options))
    }

    fn lesson() -> TranslatableFields {
        TranslatableFields {
            title: "Colors".to_string(),
            description: Some("Pick the right color".to_string()),
            statement: Some(
                ContentBlock::image("https://cdn.example.com/apple.png")
                    .with_description("An apple"),
            ),
            options: Some(vec![ContentBlock::text("Red"), ContentBlock::text("Blue")]),
        }
    }

    fn lesson_dictionary() -> DictionaryProvider {
        DictionaryProvider::new(&[
            ("Colors", "es", "Colores"),
            ("Colors", "fr", "Couleurs"),
            ("Pick the right color", "es", "Elige el color correcto"),
            ("Pick the right color", "fr", "Choisis la bonne couleur"),
            ("An apple", "es", "Una manzana"),
            ("An apple", "fr", "Une pomme"),
            ("Red", "es", "Rojo"),
            ("Red", "fr", "Rouge"),
            ("Blue", "es", "Azul"),
            ("Blue", "fr", "Bleu"),
        ])
    }

    // ==================== Leaf Tests ====================

    #[test]
    fn test_text_leaves_skip_image_content_and_empty_text() {
        let mut fields = lesson();
        fields.description = Some("   ".to_string());

        let texts: Vec<&str> = text_leaves(&fields).into_iter().map(|(_, t)| t).collect();
        assert_eq!(texts, vec!["Colors", "An apple", "Red", "Blue"]);
    }

    #[test]
    fn test_text_leaves_skip_unknown_block_kinds() {
        let fields = TranslatableFields {
            statement: Some(ContentBlock {
                kind: BlockKind::Other("video".to_string()),
                content: "https://v.example.com/1".to_string(),
                description: None,
            }),
            ..TranslatableFields::titled("Watch")
        };

        let texts: Vec<&str> = text_leaves(&fields).into_iter().map(|(_, t)| t).collect();
        assert_eq!(texts, vec!["Watch"]);
    }

    // ==================== Build Tests ====================

    #[tokio::test]
    async fn test_build_translates_every_leaf() {
        let assembler = assembler(Arc::new(lesson_dictionary()), &["en", "es", "fr"]);

        let table = assembler.build_translations(&lesson(), "en", true).await;

        assert_eq!(table.keys().collect::<Vec<_>>(), vec!["en", "es", "fr"]);
        let es = &table["es"];
        assert_eq!(es.title, "Colores");
        assert_eq!(es.description.as_deref(), Some("Elige el color correcto"));
        let statement = es.statement.as_ref().unwrap();
        assert_eq!(statement.kind, BlockKind::Image);
        assert_eq!(statement.content, "https://cdn.example.com/apple.png");
        assert_eq!(statement.description.as_deref(), Some("Una manzana"));
        let options = es.options.as_ref().unwrap();
        assert_eq!(options[0].content, "Rojo");
        assert_eq!(options[1].content, "Azul");
        assert_eq!(table["fr"].title, "Couleurs");
    }

    #[tokio::test]
    async fn test_build_keeps_identity_entry() {
        let assembler = assembler(Arc::new(lesson_dictionary()), &["en", "es", "fr"]);
        let fields = lesson();

        let table = assembler.build_translations(&fields, "en", true).await;

        assert_eq!(table["en"], fields);
    }

    #[tokio::test]
    async fn test_build_omits_empty_description() {
        let provider = Arc::new(DictionaryProvider::new(&[
            ("Hello", "es", "Hola"),
            ("Hello", "fr", "Bonjour"),
        ]));
        let assembler = assembler(provider.clone(), &["en", "es", "fr"]);
        let fields = TranslatableFields {
            description: Some(String::new()),
            ..TranslatableFields::titled("Hello")
        };

        let table = assembler.build_translations(&fields, "en", true).await;

        for entry in table.values() {
            assert_eq!(entry.description.as_deref(), Some(""));
        }
        assert_eq!(table["es"].title, "Hola");
        assert!(provider.texts_sent().iter().all(|text| text == "Hello"));
    }

    #[tokio::test]
    async fn test_build_falls_back_per_leaf_to_source_value() {
        // "Blue" has no German entry, so it fails for de only
        let provider = Arc::new(DictionaryProvider::new(&[
            ("Colors", "de", "Farben"),
            ("Red", "de", "Rot"),
            ("Pick the right color", "de", "Wähle die richtige Farbe"),
            ("An apple", "de", "Ein Apfel"),
        ]));
        let assembler = assembler(provider, &["en", "de"]);

        let table = assembler.build_translations(&lesson(), "en", true).await;

        let options = table["de"].options.as_ref().unwrap();
        assert_eq!(options[0].content, "Rot");
        assert_eq!(options[1].content, "Blue");
        assert_eq!(table["de"].title, "Farben");
    }

    #[tokio::test]
    async fn test_build_translates_repeated_text_once() {
        let provider = Arc::new(DictionaryProvider::new(&[("Yes", "es", "Sí")]));
        let assembler = assembler(provider.clone(), &["en", "es"]);
        let fields = TranslatableFields {
            options: Some(vec![ContentBlock::text("Yes"), ContentBlock::text("Yes")]),
            ..TranslatableFields::titled("Yes")
        };

        let table = assembler.build_translations(&fields, "en", true).await;

        assert_eq!(provider.texts_sent(), vec!["Yes".to_string()]);
        let options = table["es"].options.as_ref().unwrap();
        assert!(options.iter().all(|option| option.content == "Sí"));
        assert_eq!(table["es"].title, "Sí");
    }

    #[tokio::test]
    async fn test_build_without_auto_translate_is_identity_only() {
        let provider = Arc::new(lesson_dictionary());
        let assembler = assembler(provider.clone(), &["en", "es", "fr"]);
        let fields = lesson();

        let table = assembler.build_translations(&fields, "en", false).await;

        assert_eq!(table, identity_table(&fields, "en"));
        assert!(provider.texts_sent().is_empty());
    }

    #[tokio::test]
    async fn test_build_with_unconfigured_provider_is_identity_only() {
        let assembler = assembler(Arc::new(NoopProvider), &["en", "es", "fr"]);

        let table = assembler.build_translations(&lesson(), "en", true).await;

        assert_eq!(table.keys().collect::<Vec<_>>(), vec!["en"]);
    }

    #[tokio::test]
    async fn test_build_with_all_leaves_empty_still_has_source_entry() {
        let assembler = assembler(Arc::new(lesson_dictionary()), &["en", "es"]);
        let fields = TranslatableFields::titled("");

        let table = assembler.build_translations(&fields, "en", true).await;

        assert_eq!(table, identity_table(&fields, "en"));
    }

    #[tokio::test]
    async fn test_build_from_non_default_source() {
        let provider = Arc::new(DictionaryProvider::new(&[("Couleurs", "en", "Colors")]));
        let assembler = assembler(provider, &["en", "fr"]);

        let table = assembler
            .build_translations(&TranslatableFields::titled("Couleurs"), "fr", true)
            .await;

        assert_eq!(table["fr"].title, "Couleurs");
        assert_eq!(table["en"].title, "Colors");
    }

    // ==================== Translate Missing Tests ====================

    #[tokio::test]
    async fn test_translate_missing_only_returns_requested_languages() {
        let provider = Arc::new(DictionaryProvider::new(&[("Colors", "de", "Farben")]));
        let assembler = assembler(provider.clone(), &["en", "es", "fr", "de"]);

        let table = assembler
            .translate_missing(&TranslatableFields::titled("Colors"), "en", &["de"])
            .await;

        assert_eq!(table.keys().collect::<Vec<_>>(), vec!["de"]);
        assert_eq!(table["de"].title, "Farben");
        assert_eq!(provider.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_translate_missing_drops_language_with_failed_leaf() {
        // "Blue" has no German entry, so German stays missing
        let provider = Arc::new(DictionaryProvider::new(&[
            ("Colors", "de", "Farben"),
            ("Red", "de", "Rot"),
            ("Colors", "fr", "Couleurs"),
            ("Red", "fr", "Rouge"),
            ("Blue", "fr", "Bleu"),
        ]));
        let assembler = assembler(provider, &["en", "fr", "de"]);
        let mut fields = TranslatableFields::titled("Colors");
        fields.options = Some(vec![ContentBlock::text("Red"), ContentBlock::text("Blue")]);

        let table = assembler.translate_missing(&fields, "en", &["de", "fr"]).await;

        assert_eq!(table.keys().collect::<Vec<_>>(), vec!["fr"]);
        assert_eq!(table["fr"].options.as_ref().unwrap()[1].content, "Bleu");
    }

    #[tokio::test]
    async fn test_translate_missing_without_text_adds_nothing() {
        let assembler = assembler(Arc::new(TaggingProvider), &["en", "de"]);

        let table = assembler
            .translate_missing(&TranslatableFields::titled(""), "en", &["de"])
            .await;

        assert!(table.is_empty());
    }

    // ==================== Property Tests ====================

    fn block_strategy() -> impl Strategy<Value = ContentBlock> {
        (
            prop_oneof![Just(BlockKind::Text), Just(BlockKind::Image)],
            ".{0,12}",
            proptest::option::of(".{0,12}"),
        )
            .prop_map(|(kind, content, description)| ContentBlock {
                kind,
                content,
                description,
            })
    }

    fn fields_strategy() -> impl Strategy<Value = TranslatableFields> {
        (
            ".{0,16}",
            proptest::option::of(".{0,16}"),
            proptest::option::of(block_strategy()),
            proptest::option::of(proptest::collection::vec(block_strategy(), 0..4)),
        )
            .prop_map(|(title, description, statement, options)| TranslatableFields {
                title,
                description,
                statement,
                options,
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_source_entry_is_identity(
            fields in fields_strategy(),
            source in prop_oneof![Just("en"), Just("es"), Just("fr")],
            auto_translate in any::<bool>(),
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
                .unwrap();
            let assembler = assembler(Arc::new(TaggingProvider), &["en", "es", "fr"]);

            let table =
                runtime.block_on(assembler.build_translations(&fields, source, auto_translate));

            prop_assert_eq!(&table[source], &fields);
            for entry in table.values() {
                // Non-text values never change
                prop_assert_eq!(
                    entry.statement.as_ref().map(|s| s.kind.clone()),
                    fields.statement.as_ref().map(|s| s.kind.clone())
                );
                prop_assert_eq!(
                    entry.options.as_ref().map(Vec::len),
                    fields.options.as_ref().map(Vec::len)
                );
            }
        }
    }
}
