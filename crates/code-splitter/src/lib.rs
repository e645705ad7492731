//! # Context Code Splitter
//!
//! Splits source files into contiguous, line-aligned chunks whose boundaries
//! follow the declarations of the file's language.
//!
//! ## Guarantees
//!
//! For every input the chunks:
//! - Cover every line exactly once, in order, with no gaps and no overlaps
//! - Concatenate back to the exact input text
//! - Come out identical for identical input and configuration
//!
//! ## Architecture
//!
//! ```text
//! Source Text + language hint / path
//!     │
//!     ├──> Language Registry (hint, alias or extension → LanguageConfig)
//!     │
//!     ├──> Grammar Adapter (tree-sitter parse)
//!     │
//!     ├──> Boundary Extractor (pre-order walk → SyntaxSpan[])
//!     │
//!     └──> Chunk Assembler
//!          ├─> Select outermost or nested spans
//!          ├─> Sweep lines into declaration / gap segments
//!          └─> Cut oversized segments into fixed windows
//!
//! Unknown language, missing grammar or failed parse
//!     └──> Line windows (fallback)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use context_code_splitter::{Splitter, SplitterConfig};
//!
//! let splitter = Splitter::new(SplitterConfig::default()).unwrap();
//!
//! let code = r#"fn process_data(input: &str) -> String {
//!     input.trim().to_uppercase()
//! }
//!
//! fn main() {}
//! "#;
//!
//! let result = splitter.split(code, None, Some("example.rs"));
//! assert_eq!(result.reconstruct(), code);
//! for chunk in &result {
//!     println!("Chunk at lines {}-{}: {}",
//!              chunk.start_line, chunk.end_line,
//!              chunk.metadata.symbol_name.as_deref().unwrap_or_default());
//! }
//! ```

mod assembler;
mod config;
mod error;
mod extractor;
mod fallback;
mod grammar;
mod language;
mod lines;
mod splitter;
mod types;

pub use assembler::{assemble, verify_partition, AssemblyOptions};
pub use config::{GapPolicy, Granularity, SplitterConfig};
pub use error::{InvariantViolation, ParseError, Result, SplitterError};
pub use extractor::{extract, SyntaxSpan};
pub use fallback::line_windows;
pub use grammar::{Grammar, GrammarAdapter, GrammarStatus, SyntaxTree};
pub use language::{LanguageConfig, LanguageRegistry, LanguageSpec, SharedRegistry};
pub use splitter::Splitter;
pub use types::{
    Chunk, ChunkMetadata, ChunkOrigin, ChunkPart, ChunkType, FallbackReason, SplitResult,
    SplitStats,
};
