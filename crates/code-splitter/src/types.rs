use crate::error::InvariantViolation;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A contiguous slice of source text with its line range
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    /// Verbatim source lines, line terminators included
    pub content: String,

    /// Start line (1-indexed)
    pub start_line: usize,

    /// End line (1-indexed, inclusive)
    pub end_line: usize,

    /// Canonical language identifier (or fallback tag)
    pub language: String,

    /// Source file path, when the caller supplied one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,

    /// Where this chunk came from
    pub metadata: ChunkMetadata,
}

impl Chunk {
    /// Create a new chunk
    #[must_use]
    pub fn new(
        content: impl Into<String>,
        start_line: usize,
        end_line: usize,
        language: impl Into<String>,
        metadata: ChunkMetadata,
    ) -> Self {
        Self {
            content: content.into(),
            start_line,
            end_line,
            language: language.into(),
            file_path: None,
            metadata,
        }
    }

    /// Builder: set file path
    #[must_use]
    pub fn with_file_path(mut self, path: Option<&str>) -> Self {
        self.file_path = path.map(str::to_string);
        self
    }

    /// Get the number of lines in this chunk
    #[must_use]
    pub const fn line_count(&self) -> usize {
        self.end_line.saturating_sub(self.start_line) + 1
    }

    /// Check if chunk contains a specific line
    #[must_use]
    pub const fn contains_line(&self, line: usize) -> bool {
        line >= self.start_line && line <= self.end_line
    }
}

/// Metadata about a chunk
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkMetadata {
    /// How the chunk boundary was decided
    pub origin: ChunkOrigin,

    /// Syntax node type that delimited the chunk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,

    /// Coarse category of `node_type`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_type: Option<ChunkType>,

    /// Declared name (function name, contract name, etc.)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol_name: Option<String>,

    /// Position within a segment that was cut by the line limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part: Option<ChunkPart>,
}

impl ChunkMetadata {
    /// Metadata for a chunk delimited by a syntax node
    pub fn declaration(node_type: impl Into<String>) -> Self {
        let node_type = node_type.into();
        Self {
            origin: ChunkOrigin::Declaration,
            chunk_type: Some(ChunkType::from_node_type(&node_type)),
            node_type: Some(node_type),
            symbol_name: None,
            part: None,
        }
    }

    /// Metadata for lines outside every boundary
    pub const fn gap() -> Self {
        Self::untyped(ChunkOrigin::Gap)
    }

    /// Metadata for line-window fallback chunks
    pub const fn fallback() -> Self {
        Self::untyped(ChunkOrigin::Fallback)
    }

    const fn untyped(origin: ChunkOrigin) -> Self {
        Self {
            origin,
            node_type: None,
            chunk_type: None,
            symbol_name: None,
            part: None,
        }
    }

    /// Builder: mark as the residual of an enclosing declaration
    #[must_use]
    pub const fn residual(mut self) -> Self {
        self.origin = ChunkOrigin::Residual;
        self
    }

    /// Builder: set symbol name
    #[must_use]
    pub fn symbol_name(mut self, name: Option<String>) -> Self {
        self.symbol_name = name;
        self
    }

    /// Builder: set window position
    #[must_use]
    pub const fn part(mut self, index: usize, count: usize) -> Self {
        self.part = Some(ChunkPart { index, count });
        self
    }
}

/// How a chunk boundary was decided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkOrigin {
    /// A selected boundary node
    Declaration,
    /// Lines of an enclosing boundary left over after nested boundaries were cut out
    Residual,
    /// Lines outside every selected boundary
    Gap,
    /// Line window produced without syntax information
    Fallback,
}

/// Window position of a chunk cut out of a longer segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkPart {
    /// 0-based window index
    pub index: usize,
    /// Number of windows the segment was cut into
    pub count: usize,
}

/// Coarse category of a boundary node type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ChunkType {
    Function,
    Method,
    Class,
    Contract,
    Struct,
    Enum,
    Interface,
    Module,
    Impl,
    Type,
    Variable,
    Event,
    Error,
    Export,
    Other,
}

impl ChunkType {
    /// Classify a grammar node type name.
    ///
    /// Grammars name their nodes differently (`function_item`, `function_definition`,
    /// `method_declaration`, ...), so this matches on the name's keywords.
    #[must_use]
    pub fn from_node_type(node_type: &str) -> Self {
        let has = |needle: &str| node_type.contains(needle);

        if has("method") {
            Self::Method
        } else if has("function") || has("constructor") || has("modifier") {
            Self::Function
        } else if has("contract") {
            Self::Contract
        } else if has("class") {
            Self::Class
        } else if has("struct") {
            Self::Struct
        } else if has("enum") {
            Self::Enum
        } else if has("interface") || has("trait") {
            Self::Interface
        } else if has("mod_item") || has("namespace") || has("library") {
            Self::Module
        } else if has("impl") {
            Self::Impl
        } else if has("event") {
            Self::Event
        } else if has("error") {
            Self::Error
        } else if has("export") {
            Self::Export
        } else if has("type") {
            Self::Type
        } else if has("var") || has("const") || has("static") || node_type == "declaration" {
            Self::Variable
        } else {
            Self::Other
        }
    }

    /// Get human-readable name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Method => "method",
            Self::Class => "class",
            Self::Contract => "contract",
            Self::Struct => "struct",
            Self::Enum => "enum",
            Self::Interface => "interface",
            Self::Module => "module",
            Self::Impl => "impl",
            Self::Type => "type",
            Self::Variable => "variable",
            Self::Event => "event",
            Self::Error => "error",
            Self::Export => "export",
            Self::Other => "other",
        }
    }
}

/// Why a split fell back to line windows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum FallbackReason {
    /// No registry entry matched the hint or the path extension
    UnsupportedLanguage,
    /// The resolved language has no usable grammar
    GrammarUnavailable(String),
    /// The grammar loaded but produced no usable tree
    ParseFailure(String),
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedLanguage => f.write_str("unsupported language"),
            Self::GrammarUnavailable(reason) => write!(f, "grammar unavailable: {reason}"),
            Self::ParseFailure(reason) => write!(f, "parse failure: {reason}"),
        }
    }
}

/// Ordered chunks produced by one split call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SplitResult {
    /// Language tag carried by every chunk
    pub language: String,

    /// Chunks in document order
    pub chunks: Vec<Chunk>,

    /// Set when syntax-aware splitting was not possible
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<FallbackReason>,
}

impl SplitResult {
    /// Whether chunk boundaries came from a syntax tree
    #[must_use]
    pub const fn used_syntax(&self) -> bool {
        self.fallback.is_none()
    }

    /// Concatenate chunk contents; equals the split input
    #[must_use]
    pub fn reconstruct(&self) -> String {
        self.chunks.iter().map(|chunk| chunk.content.as_str()).collect()
    }

    /// Check the coverage invariants against the text this result was split from
    pub fn verify(&self, text: &str) -> Result<(), InvariantViolation> {
        crate::assembler::verify_partition(text, &self.chunks)
    }

    /// Get statistics about this result
    #[must_use]
    pub fn stats(&self) -> SplitStats {
        let count_origin = |origin: ChunkOrigin| {
            self.chunks
                .iter()
                .filter(|chunk| chunk.metadata.origin == origin)
                .count()
        };

        SplitStats {
            total_chunks: self.chunks.len(),
            total_lines: self.chunks.iter().map(Chunk::line_count).sum(),
            declaration_chunks: count_origin(ChunkOrigin::Declaration)
                + count_origin(ChunkOrigin::Residual),
            gap_chunks: count_origin(ChunkOrigin::Gap),
            fallback_chunks: count_origin(ChunkOrigin::Fallback),
            max_lines: self
                .chunks
                .iter()
                .map(Chunk::line_count)
                .max()
                .unwrap_or(0),
        }
    }
}

impl std::ops::Deref for SplitResult {
    type Target = [Chunk];

    fn deref(&self) -> &Self::Target {
        &self.chunks
    }
}

impl IntoIterator for SplitResult {
    type Item = Chunk;
    type IntoIter = std::vec::IntoIter<Chunk>;

    fn into_iter(self) -> Self::IntoIter {
        self.chunks.into_iter()
    }
}

impl<'a> IntoIterator for &'a SplitResult {
    type Item = &'a Chunk;
    type IntoIter = std::slice::Iter<'a, Chunk>;

    fn into_iter(self) -> Self::IntoIter {
        self.chunks.iter()
    }
}

/// Statistics about a split result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SplitStats {
    pub total_chunks: usize,
    pub total_lines: usize,
    pub declaration_chunks: usize,
    pub gap_chunks: usize,
    pub fallback_chunks: usize,
    pub max_lines: usize,
}

impl fmt::Display for SplitStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Chunks: {} | Lines: {} | Declarations: {} | Gaps: {} | Fallback: {} | Largest: {}",
            self.total_chunks,
            self.total_lines,
            self.declaration_chunks,
            self.gap_chunks,
            self.fallback_chunks,
            self.max_lines
        )
    }
}
