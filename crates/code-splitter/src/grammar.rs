use crate::error::ParseError;
use crate::language::LanguageConfig;
use std::fmt;
use tree_sitter::{Node, Parser, Tree};

/// A tree-sitter grammar under a stable name
#[derive(Clone)]
pub struct Grammar {
    name: String,
    language: tree_sitter::Language,
}

impl Grammar {
    pub fn new(name: impl Into<String>, language: tree_sitter::Language) -> Self {
        Self {
            name: name.into(),
            language,
        }
    }

    /// Look up a grammar compiled into this crate
    pub fn builtin(name: &str) -> Option<Self> {
        let language: tree_sitter::Language = match name {
            "rust" => tree_sitter_rust::LANGUAGE.into(),
            "python" => tree_sitter_python::LANGUAGE.into(),
            "javascript" => tree_sitter_javascript::LANGUAGE.into(),
            "typescript" => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            "tsx" => tree_sitter_typescript::LANGUAGE_TSX.into(),
            "go" => tree_sitter_go::LANGUAGE.into(),
            "java" => tree_sitter_java::LANGUAGE.into(),
            "cpp" => tree_sitter_cpp::LANGUAGE.into(),
            "csharp" => tree_sitter_c_sharp::LANGUAGE.into(),
            "solidity" => tree_sitter_solidity::LANGUAGE.into(),
            _ => return None,
        };
        Some(Self::new(name, language))
    }

    /// Names accepted by [`Grammar::builtin`]
    pub const BUILTIN_NAMES: &'static [&'static str] = &[
        "rust",
        "python",
        "javascript",
        "typescript",
        "tsx",
        "go",
        "java",
        "cpp",
        "csharp",
        "solidity",
    ];

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bind the grammar to a throwaway parser to check that the runtime accepts it
    pub fn probe(&self) -> GrammarStatus {
        let mut parser = Parser::new();
        match parser.set_language(&self.language) {
            Ok(()) => GrammarStatus::Available,
            Err(e) => GrammarStatus::Unavailable(e.to_string()),
        }
    }
}

impl fmt::Debug for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grammar").field("name", &self.name).finish()
    }
}

/// Availability of a language's grammar, recorded once at registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarStatus {
    Available,
    Unavailable(String),
}

impl GrammarStatus {
    pub const fn is_available(&self) -> bool {
        matches!(self, Self::Available)
    }
}

/// Parsed source tree
pub struct SyntaxTree {
    tree: Tree,
}

impl SyntaxTree {
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Node type of the root (`source_file`, `module`, `program`, ...)
    pub fn root_kind(&self) -> &'static str {
        self.tree.root_node().kind()
    }

    /// Whether the grammar had to recover from invalid syntax
    pub fn has_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }
}

/// Parses text with the grammar of a registered language.
///
/// Failures are returned, never retried; the facade decides what to do with them.
pub struct GrammarAdapter;

impl GrammarAdapter {
    pub fn parse(text: &str, config: &LanguageConfig) -> Result<SyntaxTree, ParseError> {
        let language = config.identifier();

        let grammar = config
            .usable_grammar()
            .map_err(|reason| ParseError::GrammarUnavailable {
                language: language.to_string(),
                reason: reason.to_string(),
            })?;

        let mut parser = Parser::new();
        parser
            .set_language(&grammar.language)
            .map_err(|e| ParseError::IncompatibleGrammar {
                language: language.to_string(),
                reason: e.to_string(),
            })?;

        let tree = parser.parse(text, None).ok_or_else(|| ParseError::NoTree {
            language: language.to_string(),
        })?;

        Ok(SyntaxTree { tree })
    }
}
