use crate::error::{Result, SplitterError};
use crate::grammar::{Grammar, GrammarStatus};
use arc_swap::ArcSwap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::{Arc, Mutex};

const JAVASCRIPT_NODE_TYPES: &[&str] = &[
    "function_declaration",
    "arrow_function",
    "class_declaration",
    "method_definition",
    "export_statement",
];

const TYPESCRIPT_NODE_TYPES: &[&str] = &[
    "function_declaration",
    "arrow_function",
    "class_declaration",
    "method_definition",
    "export_statement",
    "interface_declaration",
    "type_alias_declaration",
];

const PYTHON_NODE_TYPES: &[&str] = &[
    "function_definition",
    "class_definition",
    "decorated_definition",
    "async_function_definition",
];

const JAVA_NODE_TYPES: &[&str] = &[
    "method_declaration",
    "class_declaration",
    "interface_declaration",
    "constructor_declaration",
];

const CPP_NODE_TYPES: &[&str] = &[
    "function_definition",
    "class_specifier",
    "namespace_definition",
    "declaration",
];

const GO_NODE_TYPES: &[&str] = &[
    "function_declaration",
    "method_declaration",
    "type_declaration",
    "var_declaration",
    "const_declaration",
];

const RUST_NODE_TYPES: &[&str] = &[
    "function_item",
    "impl_item",
    "struct_item",
    "enum_item",
    "trait_item",
    "mod_item",
];

const CSHARP_NODE_TYPES: &[&str] = &[
    "method_declaration",
    "class_declaration",
    "interface_declaration",
    "struct_declaration",
    "enum_declaration",
];

const SOLIDITY_NODE_TYPES: &[&str] = &[
    "contract_declaration",
    "interface_declaration",
    "library_declaration",
    "function_definition",
    "constructor_definition",
    "modifier_definition",
    "event_definition",
    "struct_declaration",
    "enum_declaration",
    "error_definition",
    "state_variable_declaration",
];

/// (identifier, aliases, extensions, boundary node types)
type BuiltinEntry = (
    &'static str,
    &'static [&'static str],
    &'static [&'static str],
    &'static [&'static str],
);

const BUILTIN_LANGUAGES: &[BuiltinEntry] = &[
    ("rust", &["rs"], &[".rs"], RUST_NODE_TYPES),
    ("python", &["py"], &[".py", ".pyw", ".pyi"], PYTHON_NODE_TYPES),
    (
        "javascript",
        &["js"],
        &[".js", ".jsx", ".mjs", ".cjs"],
        JAVASCRIPT_NODE_TYPES,
    ),
    (
        "typescript",
        &["ts"],
        &[".ts", ".mts", ".cts"],
        TYPESCRIPT_NODE_TYPES,
    ),
    ("tsx", &[], &[".tsx"], TYPESCRIPT_NODE_TYPES),
    ("go", &["golang"], &[".go"], GO_NODE_TYPES),
    ("java", &[], &[".java"], JAVA_NODE_TYPES),
    (
        "cpp",
        &["c++", "c"],
        &[".cpp", ".cc", ".cxx", ".hpp", ".hh", ".hxx", ".c", ".h"],
        CPP_NODE_TYPES,
    ),
    ("csharp", &["cs", "c#"], &[".cs"], CSHARP_NODE_TYPES),
    ("solidity", &["sol"], &[".sol"], SOLIDITY_NODE_TYPES),
];

static DEFAULT_REGISTRY: Lazy<Arc<LanguageRegistry>> =
    Lazy::new(|| Arc::new(LanguageRegistry::build_defaults()));

/// Registry entry as configuration data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageSpec {
    /// Canonical language name
    pub identifier: String,

    /// Additional lookup names for the same config
    #[serde(default)]
    pub aliases: Vec<String>,

    /// File extensions, with or without the leading dot
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Syntax node types that delimit chunks
    pub boundary_node_types: Vec<String>,

    /// Compiled-in grammar name; defaults to `identifier`
    #[serde(default)]
    pub grammar: Option<String>,
}

/// Immutable configuration of one registered language
#[derive(Debug)]
pub struct LanguageConfig {
    identifier: String,
    aliases: Vec<String>,
    extensions: BTreeSet<String>,
    boundary_node_types: Vec<String>,
    boundary_lookup: BTreeSet<String>,
    /// Probed grammar, or why none is usable
    grammar: std::result::Result<Grammar, String>,
}

impl LanguageConfig {
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Normalized extensions (lowercase, leading dot)
    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(String::as_str)
    }

    /// Boundary node types in registration order, without duplicates
    pub fn boundary_node_types(&self) -> &[String] {
        &self.boundary_node_types
    }

    pub fn is_boundary(&self, node_type: &str) -> bool {
        self.boundary_lookup.contains(node_type)
    }

    pub fn grammar(&self) -> Option<&Grammar> {
        self.grammar.as_ref().ok()
    }

    pub fn grammar_status(&self) -> GrammarStatus {
        match &self.grammar {
            Ok(_) => GrammarStatus::Available,
            Err(reason) => GrammarStatus::Unavailable(reason.clone()),
        }
    }

    /// Grammar that passed its probe, or the reason recorded at registration
    pub(crate) fn usable_grammar(&self) -> std::result::Result<&Grammar, &str> {
        self.grammar.as_ref().map_err(String::as_str)
    }
}

/// Maps language names and file extensions to shared language configs.
///
/// Identifiers, aliases and extensions are keys into one config table, so every
/// alias of a language sees the same boundary node types. Registration fails on
/// any name or extension conflict and leaves the registry unchanged.
#[derive(Debug, Clone, Default)]
pub struct LanguageRegistry {
    configs: Vec<Arc<LanguageConfig>>,
    by_name: HashMap<String, usize>,
    by_extension: HashMap<String, usize>,
}

impl LanguageRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in languages.
    ///
    /// Built once per process; grammars are probed during that first build.
    pub fn with_defaults() -> Self {
        LanguageRegistry::clone(&DEFAULT_REGISTRY)
    }

    fn build_defaults() -> Self {
        let mut registry = Self::new();
        for (identifier, aliases, extensions, node_types) in BUILTIN_LANGUAGES {
            let spec = LanguageSpec {
                identifier: (*identifier).to_string(),
                aliases: aliases.iter().map(|a| (*a).to_string()).collect(),
                extensions: extensions.iter().map(|e| (*e).to_string()).collect(),
                boundary_node_types: node_types.iter().map(|t| (*t).to_string()).collect(),
                grammar: None,
            };
            if let Err(e) = registry.register(spec) {
                log::error!("Built-in language {identifier} failed to register: {e}");
            }
        }
        registry
    }

    /// Parse a TOML registry file.
    ///
    /// ```toml
    /// include_defaults = true
    ///
    /// [[language]]
    /// identifier = "vyper"
    /// extensions = [".vy"]
    /// boundary_node_types = ["function_definition"]
    /// grammar = "python"
    /// ```
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let file: RegistryFile = toml::from_str(source)?;
        let mut registry = if file.include_defaults {
            Self::with_defaults()
        } else {
            Self::new()
        };
        for spec in file.language {
            registry.register(spec)?;
        }
        Ok(registry)
    }

    /// Register a language whose grammar is compiled into this crate
    pub fn register(&mut self, spec: LanguageSpec) -> Result<Arc<LanguageConfig>> {
        let grammar_name = spec
            .grammar
            .clone()
            .unwrap_or_else(|| spec.identifier.to_lowercase());
        let grammar = Grammar::builtin(&grammar_name);
        self.insert(spec, grammar, &grammar_name)
    }

    /// Register a language backed by a caller-supplied grammar
    pub fn register_grammar(
        &mut self,
        spec: LanguageSpec,
        language: tree_sitter::Language,
    ) -> Result<Arc<LanguageConfig>> {
        let name = spec.identifier.to_lowercase();
        self.insert(spec, Some(Grammar::new(name.clone(), language)), &name)
    }

    /// Add another lookup name for a registered language
    pub fn alias(&mut self, alias: &str, identifier: &str) -> Result<()> {
        let alias_key = alias.trim().to_lowercase();
        let idx = *self
            .by_name
            .get(&identifier.trim().to_lowercase())
            .ok_or_else(|| SplitterError::unknown_language(identifier))?;
        if alias_key.is_empty() {
            return Err(SplitterError::invalid_config("alias must not be empty"));
        }
        if self.by_name.contains_key(&alias_key) {
            return Err(SplitterError::duplicate_language(alias_key));
        }

        let current = &self.configs[idx];
        let mut aliases = current.aliases.clone();
        aliases.push(alias_key.clone());
        self.configs[idx] = Arc::new(LanguageConfig {
            identifier: current.identifier.clone(),
            aliases,
            extensions: current.extensions.clone(),
            boundary_node_types: current.boundary_node_types.clone(),
            boundary_lookup: current.boundary_lookup.clone(),
            grammar: current.grammar.clone(),
        });
        self.by_name.insert(alias_key, idx);
        Ok(())
    }

    fn insert(
        &mut self,
        spec: LanguageSpec,
        grammar: Option<Grammar>,
        grammar_name: &str,
    ) -> Result<Arc<LanguageConfig>> {
        let identifier = spec.identifier.trim().to_lowercase();
        if identifier.is_empty() {
            return Err(SplitterError::invalid_config("identifier must not be empty"));
        }

        let mut names = vec![identifier.clone()];
        for alias in &spec.aliases {
            let alias = alias.trim().to_lowercase();
            if !alias.is_empty() && !names.contains(&alias) {
                names.push(alias);
            }
        }
        if let Some(taken) = names.iter().find(|name| self.by_name.contains_key(*name)) {
            return Err(SplitterError::duplicate_language(taken.clone()));
        }

        let extensions: BTreeSet<String> = spec
            .extensions
            .iter()
            .filter_map(|ext| normalize_extension(ext))
            .collect();
        for extension in &extensions {
            if let Some(&owner) = self.by_extension.get(extension) {
                return Err(SplitterError::ExtensionConflict {
                    extension: extension.clone(),
                    existing: self.configs[owner].identifier.clone(),
                });
            }
        }

        let mut boundary_node_types = Vec::with_capacity(spec.boundary_node_types.len());
        let mut boundary_lookup = BTreeSet::new();
        for node_type in spec.boundary_node_types {
            if boundary_lookup.insert(node_type.clone()) {
                boundary_node_types.push(node_type);
            }
        }
        if boundary_node_types.is_empty() {
            return Err(SplitterError::invalid_config(format!(
                "{identifier}: boundary_node_types must not be empty"
            )));
        }

        let grammar = match grammar {
            Some(grammar) => match grammar.probe() {
                GrammarStatus::Available => Ok(grammar),
                GrammarStatus::Unavailable(reason) => Err(reason),
            },
            None => Err(format!(
                "no grammar named {grammar_name} (built in: {})",
                Grammar::BUILTIN_NAMES.join(", ")
            )),
        };
        if let Err(reason) = &grammar {
            log::warn!("Grammar for {identifier} unavailable, using line windows: {reason}");
        }

        let config = Arc::new(LanguageConfig {
            identifier,
            aliases: names[1..].to_vec(),
            extensions,
            boundary_node_types,
            boundary_lookup,
            grammar,
        });

        let idx = self.configs.len();
        for name in names {
            self.by_name.insert(name, idx);
        }
        for extension in &config.extensions {
            self.by_extension.insert(extension.clone(), idx);
        }
        self.configs.push(Arc::clone(&config));

        Ok(config)
    }

    /// Resolve a language: a registered hint wins, then the path extension
    pub fn resolve(
        &self,
        language_hint: Option<&str>,
        path: Option<&Path>,
    ) -> Option<Arc<LanguageConfig>> {
        let by_hint = language_hint
            .map(|hint| hint.trim().to_lowercase())
            .and_then(|hint| self.by_name.get(&hint).copied());

        let idx = by_hint.or_else(|| {
            path.and_then(|p| p.extension())
                .and_then(|ext| ext.to_str())
                .and_then(normalize_extension)
                .and_then(|ext| self.by_extension.get(&ext).copied())
        })?;

        Some(Arc::clone(&self.configs[idx]))
    }

    /// Registered languages in registration order
    pub fn languages(&self) -> impl Iterator<Item = &Arc<LanguageConfig>> {
        self.configs.iter()
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct RegistryFile {
    #[serde(default = "default_true")]
    include_defaults: bool,
    #[serde(default)]
    language: Vec<LanguageSpec>,
}

const fn default_true() -> bool {
    true
}

fn normalize_extension(ext: &str) -> Option<String> {
    let ext = ext.trim().trim_start_matches('.');
    if ext.is_empty() {
        None
    } else {
        Some(format!(".{}", ext.to_lowercase()))
    }
}

/// Registry shared across threads.
///
/// Reads take an immutable snapshot without locking; writers are serialized,
/// build a new registry from the current snapshot, and swap it in.
pub struct SharedRegistry {
    current: ArcSwap<LanguageRegistry>,
    writer: Mutex<()>,
}

impl SharedRegistry {
    pub fn new(registry: LanguageRegistry) -> Self {
        Self {
            current: ArcSwap::from_pointee(registry),
            writer: Mutex::new(()),
        }
    }

    /// Current registry; unaffected by later registrations
    pub fn snapshot(&self) -> Arc<LanguageRegistry> {
        self.current.load_full()
    }

    pub fn register(&self, spec: LanguageSpec) -> Result<Arc<LanguageConfig>> {
        self.update(|registry| registry.register(spec))
    }

    pub fn register_grammar(
        &self,
        spec: LanguageSpec,
        language: tree_sitter::Language,
    ) -> Result<Arc<LanguageConfig>> {
        self.update(|registry| registry.register_grammar(spec, language))
    }

    pub fn alias(&self, alias: &str, identifier: &str) -> Result<()> {
        self.update(|registry| registry.alias(alias, identifier))
    }

    /// Register every language of a TOML registry file on top of the current snapshot
    pub fn load_toml(&self, source: &str) -> Result<()> {
        let file: RegistryFile = toml::from_str(source)?;
        self.update(|registry| {
            if !file.include_defaults {
                *registry = LanguageRegistry::new();
            }
            for spec in file.language {
                registry.register(spec)?;
            }
            Ok(())
        })
    }

    fn update<T>(&self, apply: impl FnOnce(&mut LanguageRegistry) -> Result<T>) -> Result<T> {
        let _guard = self
            .writer
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut next = LanguageRegistry::clone(&self.current.load());
        let out = apply(&mut next)?;
        self.current.store(Arc::new(next));
        Ok(out)
    }
}

impl Default for SharedRegistry {
    fn default() -> Self {
        Self::new(LanguageRegistry::with_defaults())
    }
}

impl From<LanguageRegistry> for SharedRegistry {
    fn from(registry: LanguageRegistry) -> Self {
        Self::new(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn spec(identifier: &str, aliases: &[&str], extensions: &[&str]) -> LanguageSpec {
        LanguageSpec {
            identifier: identifier.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            extensions: extensions.iter().map(|e| e.to_string()).collect(),
            boundary_node_types: vec!["function_definition".to_string()],
            grammar: Some("python".to_string()),
        }
    }

    #[test]
    fn test_resolve_by_hint_case_insensitive() {
        let registry = LanguageRegistry::with_defaults();
        let config = registry.resolve(Some("Solidity"), None).unwrap();
        assert_eq!(config.identifier(), "solidity");
        let config = registry.resolve(Some("RS"), None).unwrap();
        assert_eq!(config.identifier(), "rust");
    }

    #[test]
    fn test_resolve_by_extension() {
        let registry = LanguageRegistry::with_defaults();
        let config = registry
            .resolve(None, Some(Path::new("contracts/Bank.SOL")))
            .unwrap();
        assert_eq!(config.identifier(), "solidity");
        assert!(registry.resolve(None, Some(Path::new("README"))).is_none());
        assert!(registry.resolve(None, Some(Path::new("notes.md"))).is_none());
    }

    #[test]
    fn test_hint_wins_over_extension() {
        let registry = LanguageRegistry::with_defaults();
        let config = registry
            .resolve(Some("python"), Some(Path::new("main.rs")))
            .unwrap();
        assert_eq!(config.identifier(), "python");
    }

    #[test]
    fn test_unknown_hint_falls_through_to_extension() {
        let registry = LanguageRegistry::with_defaults();
        let config = registry
            .resolve(Some("not-a-real-lang"), Some(Path::new("main.go")))
            .unwrap();
        assert_eq!(config.identifier(), "go");
        assert!(registry.resolve(Some("not-a-real-lang"), None).is_none());
    }

    #[test]
    fn test_aliases_share_one_config() {
        let registry = LanguageRegistry::with_defaults();
        let full = registry.resolve(Some("solidity"), None).unwrap();
        let short = registry.resolve(Some("sol"), None).unwrap();
        assert!(Arc::ptr_eq(&full, &short));
        assert_eq!(full.boundary_node_types().len(), 11);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registry = LanguageRegistry::with_defaults();
        let err = registry.register(spec("vyper", &["py"], &[".vy"])).unwrap_err();
        assert!(matches!(err, SplitterError::DuplicateLanguage(name) if name == "py"));
        assert!(registry.resolve(Some("vyper"), None).is_none());
    }

    #[test]
    fn test_extension_conflict_rejected() {
        let mut registry = LanguageRegistry::with_defaults();
        let err = registry
            .register(spec("starlark", &[], &["bzl", "PY"]))
            .unwrap_err();
        match err {
            SplitterError::ExtensionConflict {
                extension,
                existing,
            } => {
                assert_eq!(extension, ".py");
                assert_eq!(existing, "python");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(registry.resolve(None, Some(Path::new("BUILD.bzl"))).is_none());
    }

    #[test]
    fn test_boundary_types_deduplicated_in_order() {
        let mut registry = LanguageRegistry::new();
        let config = registry
            .register(LanguageSpec {
                boundary_node_types: vec![
                    "class_definition".into(),
                    "function_definition".into(),
                    "class_definition".into(),
                ],
                ..spec("python", &[], &[".py"])
            })
            .unwrap();
        assert_eq!(
            config.boundary_node_types(),
            &["class_definition".to_string(), "function_definition".to_string()]
        );
        assert!(config.is_boundary("function_definition"));
        assert!(!config.is_boundary("module"));
    }

    #[test]
    fn test_empty_boundary_types_rejected() {
        let mut registry = LanguageRegistry::new();
        let result = registry.register(LanguageSpec {
            boundary_node_types: vec![],
            ..spec("python", &[], &[".py"])
        });
        assert!(matches!(result, Err(SplitterError::InvalidConfig(_))));
    }

    #[test]
    fn test_unknown_grammar_registers_as_unavailable() {
        let mut registry = LanguageRegistry::new();
        let config = registry
            .register(LanguageSpec {
                grammar: Some("fortran".into()),
                ..spec("fortran", &["f90"], &[".f90"])
            })
            .unwrap();
        assert!(config.grammar().is_none());
        match config.grammar_status() {
            GrammarStatus::Unavailable(reason) => {
                assert!(reason.contains("fortran"));
                assert!(reason.contains("solidity"));
            }
            GrammarStatus::Available => panic!("fortran has no grammar"),
        }
    }

    #[test]
    fn test_every_default_language_has_usable_grammar() {
        let registry = LanguageRegistry::with_defaults();
        for config in registry.languages() {
            assert_eq!(
                config.grammar_status(),
                GrammarStatus::Available,
                "{}",
                config.identifier()
            );
            assert!(config.grammar().is_some());
        }
    }

    #[test]
    fn test_alias_added_after_registration() {
        let mut registry = LanguageRegistry::with_defaults();
        registry.alias("Rustlang", "rust").unwrap();
        let config = registry.resolve(Some("rustlang"), None).unwrap();
        assert_eq!(config.identifier(), "rust");
        assert!(config.aliases().contains(&"rustlang".to_string()));
        assert!(matches!(
            registry.alias("rs", "python"),
            Err(SplitterError::DuplicateLanguage(_))
        ));
        assert!(matches!(
            registry.alias("x", "nope"),
            Err(SplitterError::UnknownLanguage(_))
        ));
    }

    #[test]
    fn test_languages_in_registration_order() {
        let registry = LanguageRegistry::with_defaults();
        let ids: Vec<_> = registry.languages().map(|c| c.identifier()).collect();
        assert_eq!(ids.first(), Some(&"rust"));
        assert_eq!(ids.last(), Some(&"solidity"));
        assert_eq!(ids.len(), BUILTIN_LANGUAGES.len());
    }

    #[test]
    fn test_from_toml_str() {
        let registry = LanguageRegistry::from_toml_str(
            r#"
include_defaults = false

[[language]]
identifier = "Vyper"
aliases = ["vy"]
extensions = ["vy"]
boundary_node_types = ["function_definition", "class_definition"]
grammar = "python"
"#,
        )
        .unwrap();
        assert_eq!(registry.len(), 1);
        let config = registry.resolve(None, Some(Path::new("token.vy"))).unwrap();
        assert_eq!(config.identifier(), "vyper");
        assert!(config.grammar_status().is_available());
    }

    #[test]
    fn test_from_toml_str_rejects_malformed() {
        let err = LanguageRegistry::from_toml_str("[[language]]\nidentifier = 3").unwrap_err();
        assert!(matches!(err, SplitterError::RegistryFormat(_)));
    }

    #[test]
    fn test_shared_registry_snapshot_isolated_from_writes() {
        let shared = SharedRegistry::default();
        let before = shared.snapshot();
        shared.register(spec("vyper", &["vy"], &[".vy"])).unwrap();

        assert!(before.resolve(Some("vyper"), None).is_none());
        assert!(shared.snapshot().resolve(Some("vy"), None).is_some());
    }

    #[test]
    fn test_shared_registry_failed_write_keeps_snapshot() {
        let shared = SharedRegistry::default();
        let before = shared.snapshot();
        assert!(shared.register(spec("rust", &[], &[])).is_err());
        assert!(Arc::ptr_eq(&before, &shared.snapshot()));
    }

    #[test]
    fn test_shared_registry_load_toml() {
        let shared = SharedRegistry::default();
        shared
            .load_toml(
                r#"
[[language]]
identifier = "starlark"
extensions = [".bzl", ".star"]
boundary_node_types = ["function_definition"]
grammar = "python"
"#,
            )
            .unwrap();
        let snapshot = shared.snapshot();
        assert!(snapshot.resolve(Some("rust"), None).is_some());
        assert_eq!(
            snapshot
                .resolve(None, Some(Path::new("rules.star")))
                .unwrap()
                .identifier(),
            "starlark"
        );
    }
}
