use serde::{Deserialize, Serialize};

/// Configuration for splitting behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitterConfig {
    /// Upper bound on lines per chunk; longer segments are cut into fixed windows.
    /// `None` keeps every declaration whole.
    pub max_chunk_lines: Option<usize>,

    /// Window size used when no grammar is usable for the input
    pub fallback_window_lines: usize,

    /// Which boundary nodes become chunks when boundaries nest
    pub granularity: Granularity,

    /// What happens to lines outside every selected boundary
    pub gap_policy: GapPolicy,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            max_chunk_lines: None,
            fallback_window_lines: 50,
            granularity: Granularity::Outermost,
            gap_policy: GapPolicy::Standalone,
        }
    }
}

impl SplitterConfig {
    /// Create config optimized for embeddings (bounded, focused chunks)
    pub fn for_embeddings() -> Self {
        Self {
            max_chunk_lines: Some(60),
            fallback_window_lines: 40,
            ..Default::default()
        }
    }

    /// Create config optimized for LLM context (larger chunks with their leading comments)
    pub fn for_llm_context() -> Self {
        Self {
            max_chunk_lines: Some(200),
            fallback_window_lines: 100,
            gap_policy: GapPolicy::AttachLeading,
            ..Default::default()
        }
    }

    /// Create config that emits every configured boundary as its own chunk
    pub fn fine_grained() -> Self {
        Self {
            granularity: Granularity::Nested,
            ..Default::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_chunk_lines == Some(0) {
            return Err("max_chunk_lines must be > 0 when set".to_string());
        }

        if self.fallback_window_lines == 0 {
            return Err("fallback_window_lines must be > 0".to_string());
        }

        Ok(())
    }
}

/// Chunk granularity when configured boundaries nest inside each other
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    /// Only the least-nested boundary at each position becomes a chunk
    #[default]
    Outermost,

    /// Every boundary becomes a chunk; the enclosing declaration keeps the
    /// lines its nested boundaries do not cover
    Nested,
}

/// Treatment of source lines not covered by any selected boundary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapPolicy {
    /// Uncovered runs become untyped chunks of their own
    #[default]
    Standalone,

    /// An uncovered run directly before a declaration joins that declaration's chunk
    AttachLeading,
}
