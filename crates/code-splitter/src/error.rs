use thiserror::Error;

/// Result type for registry and configuration operations
pub type Result<T> = std::result::Result<T, SplitterError>;

/// Errors raised while configuring the splitter or mutating the language registry.
///
/// Splitting itself never fails; see [`ParseError`] for the recoverable parse path.
#[derive(Error, Debug)]
pub enum SplitterError {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Identifier or alias is already registered
    #[error("Language name already registered: {0}")]
    DuplicateLanguage(String),

    /// Extension is already owned by another language
    #[error("Extension {extension} is already registered for {existing}")]
    ExtensionConflict { extension: String, existing: String },

    /// Alias target or lookup name is not registered
    #[error("Unknown language: {0}")]
    UnknownLanguage(String),

    /// Registry file could not be decoded
    #[error("Invalid registry file: {0}")]
    RegistryFormat(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SplitterError {
    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a duplicate language error
    pub fn duplicate_language(name: impl Into<String>) -> Self {
        Self::DuplicateLanguage(name.into())
    }

    /// Create an unknown language error
    pub fn unknown_language(name: impl Into<String>) -> Self {
        Self::UnknownLanguage(name.into())
    }
}

impl From<toml::de::Error> for SplitterError {
    fn from(err: toml::de::Error) -> Self {
        Self::RegistryFormat(err.to_string())
    }
}

/// Errors produced by the grammar adapter. All of them are recovered by the
/// facade through line-window fallback.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The language has no usable grammar (missing or failed its startup probe)
    #[error("Grammar unavailable for {language}: {reason}")]
    GrammarUnavailable { language: String, reason: String },

    /// The parser runtime rejected the grammar when binding it
    #[error("Grammar for {language} is incompatible with the parser runtime: {reason}")]
    IncompatibleGrammar { language: String, reason: String },

    /// The parser returned no tree
    #[error("Parser produced no tree for {language}")]
    NoTree { language: String },
}

/// Coverage invariant broken by an assembled chunk sequence.
///
/// Only produced by [`crate::verify_partition`]; a violation coming out of the
/// assembler is a bug in boundary selection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("empty input produced {count} chunks")]
    NonEmptyForEmptyInput { count: usize },

    #[error("first chunk starts at line {start}, expected 1")]
    StartsAfterFirstLine { start: usize },

    #[error("chunk {index} has end line {end} before start line {start}")]
    InvertedRange {
        index: usize,
        start: usize,
        end: usize,
    },

    #[error("gap between line {previous_end} and line {next_start}")]
    Gap {
        previous_end: usize,
        next_start: usize,
    },

    #[error("chunk starting at line {next_start} overlaps chunk ending at line {previous_end}")]
    Overlap {
        previous_end: usize,
        next_start: usize,
    },

    #[error("last chunk ends at line {end}, input has {total} lines")]
    EndsBeforeLastLine { end: usize, total: usize },

    #[error("chunk {index} content does not match source lines {start}-{end}")]
    ContentMismatch {
        index: usize,
        start: usize,
        end: usize,
    },
}
