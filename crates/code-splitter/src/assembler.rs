use crate::config::{GapPolicy, Granularity, SplitterConfig};
use crate::error::InvariantViolation;
use crate::extractor::SyntaxSpan;
use crate::lines::LineIndex;
use crate::types::{Chunk, ChunkMetadata};

/// Options for turning boundary spans into chunks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblyOptions {
    pub max_chunk_lines: Option<usize>,
    pub granularity: Granularity,
    pub gap_policy: GapPolicy,
}

impl From<&SplitterConfig> for AssemblyOptions {
    fn from(config: &SplitterConfig) -> Self {
        Self {
            max_chunk_lines: config.max_chunk_lines,
            granularity: config.granularity,
            gap_policy: config.gap_policy,
        }
    }
}

/// Line range owned by one span, or by no span (gap)
#[derive(Debug, Clone, Copy)]
struct Segment<'s> {
    start: usize,
    end: usize,
    owner: Option<Owner<'s>>,
}

#[derive(Debug, Clone, Copy)]
struct Owner<'s> {
    span: &'s SyntaxSpan,
    residual: bool,
}

/// Partition `text` into chunks whose boundaries follow `spans`.
///
/// The output covers every line exactly once, in order. Spans may nest or
/// share lines; `options.granularity` decides which of them own lines.
pub fn assemble(
    text: &str,
    spans: &[SyntaxSpan],
    language: &str,
    options: &AssemblyOptions,
) -> Vec<Chunk> {
    let index = LineIndex::new(text);
    let total = index.line_count();
    if total == 0 {
        return Vec::new();
    }

    let mut ordered: Vec<&SyntaxSpan> = spans.iter().collect();
    // Document pre-order: ancestors before the descendants that start with them.
    ordered.sort_by(|a, b| {
        a.start_byte
            .cmp(&b.start_byte)
            .then_with(|| b.end_byte.cmp(&a.end_byte))
    });

    let selected = match options.granularity {
        Granularity::Outermost => outermost(&ordered),
        Granularity::Nested => ordered,
    };

    let mut segments = sweep(&selected, total);
    if options.gap_policy == GapPolicy::AttachLeading {
        segments = attach_leading_gaps(segments);
    }

    let mut chunks = Vec::with_capacity(segments.len());
    for segment in segments {
        emit_segment(&index, &segment, language, options.max_chunk_lines, &mut chunks);
    }

    log::trace!(
        "Assembled {} chunks from {} spans over {} lines",
        chunks.len(),
        spans.len(),
        total
    );

    debug_assert!(
        verify_partition(text, &chunks).is_ok(),
        "chunk assembly broke line coverage: {:?}",
        verify_partition(text, &chunks).err()
    );

    chunks
}

/// Drop spans nested inside an earlier selected span
fn outermost<'s>(ordered: &[&'s SyntaxSpan]) -> Vec<&'s SyntaxSpan> {
    let mut selected: Vec<&'s SyntaxSpan> = Vec::new();
    for &span in ordered {
        if !selected.last().is_some_and(|last| last.contains(span)) {
            selected.push(span);
        }
    }
    selected
}

/// Assign every line to the innermost open span covering it.
///
/// Spans are visited in pre-order with a stack of open spans. Syntax spans
/// either nest or are disjoint, so an open span that does not contain the
/// current one is finished. A line range is emitted only from `next` onward:
/// a line shared by two spans belongs to the one that opened first, segments
/// never overlap, and the final emission reaches `total`.
fn sweep<'s>(selected: &[&'s SyntaxSpan], total: usize) -> Vec<Segment<'s>> {
    let mut segments = Vec::new();
    let mut stack: Vec<Open<'s>> = Vec::new();
    let mut next = 1;

    for &span in selected {
        while let Some(top) = stack.last() {
            if top.span.contains(span) {
                break;
            }
            let (top_end, top_owner) = (top.end, top.owner());
            stack.pop();
            push_segment(&mut segments, &mut next, top_end, Some(top_owner));
        }

        let end = span.end_line.min(total);
        let start = span.start_line.clamp(1, end.max(1));
        // Every line of the span already belongs to an earlier one.
        if end < next {
            continue;
        }

        if let Some(top) = stack.last_mut() {
            top.nested = true;
        }

        if start > next {
            let enclosing = stack.last().map(Open::owner);
            push_segment(&mut segments, &mut next, start - 1, enclosing);
        }

        stack.push(Open {
            span,
            end,
            nested: false,
        });
    }

    while let Some(top) = stack.pop() {
        let end = top.end;
        push_segment(&mut segments, &mut next, end, Some(top.owner()));
    }
    push_segment(&mut segments, &mut next, total, None);

    segments
}

/// Span on the sweep stack
struct Open<'s> {
    span: &'s SyntaxSpan,
    end: usize,
    /// Set once a boundary nested inside this span has been pushed
    nested: bool,
}

impl<'s> Open<'s> {
    fn owner(&self) -> Owner<'s> {
        Owner {
            span: self.span,
            residual: self.nested,
        }
    }
}

fn push_segment<'s>(
    segments: &mut Vec<Segment<'s>>,
    next: &mut usize,
    end: usize,
    owner: Option<Owner<'s>>,
) {
    if *next <= end {
        segments.push(Segment {
            start: *next,
            end,
            owner,
        });
        *next = end + 1;
    }
}

/// Merge each gap into the declaration that directly follows it
fn attach_leading_gaps(segments: Vec<Segment<'_>>) -> Vec<Segment<'_>> {
    let mut out = Vec::with_capacity(segments.len());
    let mut pending_gap: Option<Segment<'_>> = None;

    for segment in segments {
        match (segment.owner, pending_gap.take()) {
            (None, Some(gap)) => {
                pending_gap = Some(Segment {
                    end: segment.end,
                    ..gap
                });
            }
            (None, None) => pending_gap = Some(segment),
            (Some(_), Some(gap)) => out.push(Segment {
                start: gap.start,
                ..segment
            }),
            (Some(_), None) => out.push(segment),
        }
    }
    out.extend(pending_gap);
    out
}

fn emit_segment(
    index: &LineIndex<'_>,
    segment: &Segment<'_>,
    language: &str,
    max_lines: Option<usize>,
    chunks: &mut Vec<Chunk>,
) {
    let metadata = match segment.owner {
        Some(owner) => {
            let metadata = ChunkMetadata::declaration(owner.span.node_type.clone())
                .symbol_name(owner.span.name.clone());
            if owner.residual {
                metadata.residual()
            } else {
                metadata
            }
        }
        None => ChunkMetadata::gap(),
    };

    let len = segment.end - segment.start + 1;
    match max_lines {
        Some(max) if max > 0 && len > max => {
            let count = len.div_ceil(max);
            for (part, start) in (segment.start..=segment.end).step_by(max).enumerate() {
                let end = (start + max - 1).min(segment.end);
                chunks.push(Chunk::new(
                    index.slice(start, end),
                    start,
                    end,
                    language,
                    metadata.clone().part(part, count),
                ));
            }
        }
        _ => chunks.push(Chunk::new(
            index.slice(segment.start, segment.end),
            segment.start,
            segment.end,
            language,
            metadata,
        )),
    }
}

/// Check that `chunks` cover the lines of `text` in order, exactly once, verbatim
pub fn verify_partition(text: &str, chunks: &[Chunk]) -> Result<(), InvariantViolation> {
    let index = LineIndex::new(text);
    let total = index.line_count();

    if total == 0 {
        return if chunks.is_empty() {
            Ok(())
        } else {
            Err(InvariantViolation::NonEmptyForEmptyInput {
                count: chunks.len(),
            })
        };
    }

    let Some(first) = chunks.first() else {
        return Err(InvariantViolation::EndsBeforeLastLine { end: 0, total });
    };
    if first.start_line != 1 {
        return Err(InvariantViolation::StartsAfterFirstLine {
            start: first.start_line,
        });
    }

    let mut previous_end = 0;
    for (idx, chunk) in chunks.iter().enumerate() {
        if chunk.end_line < chunk.start_line {
            return Err(InvariantViolation::InvertedRange {
                index: idx,
                start: chunk.start_line,
                end: chunk.end_line,
            });
        }
        if idx > 0 {
            if chunk.start_line > previous_end + 1 {
                return Err(InvariantViolation::Gap {
                    previous_end,
                    next_start: chunk.start_line,
                });
            }
            if chunk.start_line <= previous_end {
                return Err(InvariantViolation::Overlap {
                    previous_end,
                    next_start: chunk.start_line,
                });
            }
        }
        if chunk.end_line > total || chunk.content != index.slice(chunk.start_line, chunk.end_line)
        {
            return Err(InvariantViolation::ContentMismatch {
                index: idx,
                start: chunk.start_line,
                end: chunk.end_line,
            });
        }
        previous_end = chunk.end_line;
    }

    if previous_end != total {
        return Err(InvariantViolation::EndsBeforeLastLine {
            end: previous_end,
            total,
        });
    }

    Ok(())
}
