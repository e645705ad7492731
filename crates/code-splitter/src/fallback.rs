use crate::lines::LineIndex;
use crate::types::{Chunk, ChunkMetadata};

/// Fixed line windows with no syntax awareness.
///
/// Used whenever no grammar is usable for the input. The last window may be shorter.
pub fn line_windows(text: &str, window_lines: usize, language: &str) -> Vec<Chunk> {
    let index = LineIndex::new(text);
    let total = index.line_count();
    let window = window_lines.max(1);
    let count = total.div_ceil(window);

    (1..=total)
        .step_by(window)
        .enumerate()
        .map(|(part, start)| {
            let end = (start + window - 1).min(total);
            let mut metadata = ChunkMetadata::fallback();
            if count > 1 {
                metadata = metadata.part(part, count);
            }
            Chunk::new(index.slice(start, end), start, end, language, metadata)
        })
        .collect()
}
