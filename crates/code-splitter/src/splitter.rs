use crate::assembler::{assemble, AssemblyOptions};
use crate::config::SplitterConfig;
use crate::error::{ParseError, Result, SplitterError};
use crate::extractor::extract;
use crate::fallback::line_windows;
use crate::grammar::GrammarAdapter;
use crate::language::{LanguageConfig, LanguageRegistry, SharedRegistry};
use crate::types::{FallbackReason, SplitResult};
use std::path::Path;
use std::sync::Arc;

/// Tag for fallback chunks when neither a language nor a hint is known
const PLAIN_TEXT: &str = "text";

/// Main splitter interface
///
/// `split` never fails: unsupported languages, unusable grammars and parse
/// failures degrade to line windows.
pub struct Splitter {
    config: SplitterConfig,
    registry: Arc<SharedRegistry>,
}

impl Splitter {
    /// Create a splitter over the built-in languages
    pub fn new(config: SplitterConfig) -> Result<Self> {
        Self::with_registry(config, Arc::new(SharedRegistry::default()))
    }

    /// Create a splitter over a caller-managed registry
    pub fn with_registry(config: SplitterConfig, registry: Arc<SharedRegistry>) -> Result<Self> {
        config.validate().map_err(SplitterError::invalid_config)?;
        Ok(Self { config, registry })
    }

    /// Split `text` into chunks.
    ///
    /// The language is the registered `language` hint if there is one, otherwise
    /// it is looked up by the extension of `path`.
    pub fn split(&self, text: &str, language: Option<&str>, path: Option<&str>) -> SplitResult {
        let registry = self.registry.snapshot();
        let resolved = registry.resolve(language, path.map(Path::new));

        let Some(config) = resolved else {
            let tag = fallback_tag(language);
            log::debug!(
                "No language registered for hint {:?} / path {:?}, splitting by lines",
                language,
                path
            );
            return self.fallback(text, tag, path, FallbackReason::UnsupportedLanguage);
        };

        match self.split_syntax(text, &config, path) {
            Ok(result) => result,
            Err(e) => {
                log::debug!("Syntax split failed for {}: {e}", config.identifier());
                let reason = match e {
                    ParseError::GrammarUnavailable { reason, .. }
                    | ParseError::IncompatibleGrammar { reason, .. } => {
                        FallbackReason::GrammarUnavailable(reason)
                    }
                    ParseError::NoTree { .. } => FallbackReason::ParseFailure(e.to_string()),
                };
                self.fallback(text, config.identifier().to_string(), path, reason)
            }
        }
    }

    fn split_syntax(
        &self,
        text: &str,
        config: &LanguageConfig,
        path: Option<&str>,
    ) -> std::result::Result<SplitResult, ParseError> {
        let language = config.identifier().to_string();
        if text.is_empty() {
            return Ok(SplitResult {
                language,
                chunks: Vec::new(),
                fallback: None,
            });
        }

        let tree = GrammarAdapter::parse(text, config)?;
        if tree.has_errors() {
            log::debug!(
                "{language} source has syntax errors, using recovered {} tree",
                tree.root_kind()
            );
        }

        let spans = extract(&tree, config, text);
        let options = AssemblyOptions::from(&self.config);
        let chunks = assemble(text, &spans, &language, &options)
            .into_iter()
            .map(|chunk| chunk.with_file_path(path))
            .collect();

        Ok(SplitResult {
            language,
            chunks,
            fallback: None,
        })
    }

    fn fallback(
        &self,
        text: &str,
        language: String,
        path: Option<&str>,
        reason: FallbackReason,
    ) -> SplitResult {
        let chunks = line_windows(text, self.config.fallback_window_lines, &language)
            .into_iter()
            .map(|chunk| chunk.with_file_path(path))
            .collect();

        SplitResult {
            language,
            chunks,
            fallback: Some(reason),
        }
    }

    /// Get configuration
    #[must_use]
    pub const fn config(&self) -> &SplitterConfig {
        &self.config
    }

    /// Registry this splitter resolves languages against
    #[must_use]
    pub fn registry(&self) -> &Arc<SharedRegistry> {
        &self.registry
    }

    /// Snapshot of the registered languages
    #[must_use]
    pub fn languages(&self) -> Arc<LanguageRegistry> {
        self.registry.snapshot()
    }
}

impl Default for Splitter {
    fn default() -> Self {
        Self {
            config: SplitterConfig::default(),
            registry: Arc::new(SharedRegistry::default()),
        }
    }
}

fn fallback_tag(language: Option<&str>) -> String {
    language
        .map(|hint| hint.trim().to_lowercase())
        .filter(|hint| !hint.is_empty())
        .unwrap_or_else(|| PLAIN_TEXT.to_string())
}
