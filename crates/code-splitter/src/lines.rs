/// Line table over a source text.
///
/// A line is a `\n`-terminated piece of the text including its terminator; a
/// trailing piece without terminator is a line too. Slices taken through this
/// index therefore concatenate back to the original text.
pub(crate) struct LineIndex<'a> {
    text: &'a str,
    starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        let mut starts = Vec::new();
        if !text.is_empty() {
            starts.push(0);
            starts.extend(
                text.match_indices('\n')
                    .map(|(idx, _)| idx + 1)
                    .filter(|&start| start < text.len()),
            );
        }
        Self { text, starts }
    }

    /// Number of lines (0 for empty text)
    pub(crate) fn line_count(&self) -> usize {
        self.starts.len()
    }

    /// Text of lines `start..=end` (1-indexed, inclusive), terminators included
    pub(crate) fn slice(&self, start: usize, end: usize) -> &'a str {
        debug_assert!(start >= 1 && start <= end && end <= self.line_count());
        let from = self.starts[start - 1];
        let to = self.starts.get(end).copied().unwrap_or(self.text.len());
        &self.text[from..to]
    }
}
