//! Recover resolutions from an externally edited merged file.
//!
//! Text segments anchor the edited file to the document; whatever sits
//! between two anchors is the edited form of the conflict between them.

use tracing::debug;

use crate::errors::ReconcileError;
use crate::lines::{find_subslice, split_keep_eol};
use crate::markers::{is_marker_line, ConflictSegment, Document, ManualResolutions, Resolution, Segment};

/// What reconciliation concluded for a single conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictOutcome {
    /// The span matched a canonical resolution.
    Canonical(Resolution),
    /// The span matched nothing and was stored in the manual map.
    Manual,
    /// The span still contains conflict markers.
    Untouched,
}

/// Result of [`reconcile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// Copy of the input document with recovered resolutions applied.
    pub document: Document,
    /// Verbatim spans of conflicts that matched no canonical resolution.
    pub manual: ManualResolutions,
    /// One outcome per conflict, in enumeration order.
    pub outcomes: Vec<ConflictOutcome>,
}

/// Reconcile `doc` against `edited`.
///
/// Resolutions already present in `doc` are discarded; the result reflects
/// only what the edited bytes show. Every conflict ends up with exactly one
/// of a canonical resolution, a manual entry, or neither.
pub fn reconcile(doc: &Document, edited: &[u8]) -> Result<Reconciliation, ReconcileError> {
    let lines = split_keep_eol(edited);
    let segments = doc.segments();
    let mut document = doc.clone();
    let mut manual = ManualResolutions::new();
    let mut outcomes = Vec::with_capacity(doc.conflict_count());
    let mut pos = 0;
    // Set while an untouched span covers the conflicts up to the next text.
    let mut marker_span_open = false;

    for (seg_index, seg) in segments.iter().enumerate() {
        match seg {
            Segment::Text(t) => {
                let text_lines = split_keep_eol(&t.bytes);
                if text_lines.is_empty() {
                    continue;
                }
                let idx = find_subslice(&lines, pos, &text_lines)
                    .ok_or(ReconcileError::TextSegmentNotFound { segment: seg_index })?;
                pos = idx + text_lines.len();
                marker_span_open = false;
            }
            Segment::Conflict(_) if marker_span_open => {
                // Adjacent conflicts share the span that still holds markers.
                document.set_resolution(outcomes.len(), Resolution::Unset);
                outcomes.push(ConflictOutcome::Untouched);
            }
            Segment::Conflict(c) => {
                let conflict_index = outcomes.len();
                let end = match next_text_lines(segments, seg_index + 1) {
                    Some((next_index, next_lines)) => find_subslice(&lines, pos, &next_lines)
                        .ok_or(ReconcileError::TextSegmentNotFound {
                            segment: next_index,
                        })?,
                    None => lines.len(),
                };
                let span = &lines[pos..end];
                pos = end;

                let outcome = classify_span(span, c);
                let resolution = match outcome {
                    ConflictOutcome::Canonical(r) => r,
                    ConflictOutcome::Manual => {
                        manual.insert(conflict_index, span.concat());
                        Resolution::Unset
                    }
                    ConflictOutcome::Untouched => {
                        marker_span_open = true;
                        Resolution::Unset
                    }
                };
                document.set_resolution(conflict_index, resolution);
                outcomes.push(outcome);
            }
        }
    }

    debug!(
        conflicts = outcomes.len(),
        manual = manual.len(),
        "reconciled edited file"
    );
    Ok(Reconciliation {
        document,
        manual,
        outcomes,
    })
}

/// Lines of the first non-empty text segment at or after `start`.
fn next_text_lines(segments: &[Segment], start: usize) -> Option<(usize, Vec<&[u8]>)> {
    segments
        .iter()
        .enumerate()
        .skip(start)
        .filter_map(|(i, seg)| seg.as_text().map(|t| (i, split_keep_eol(&t.bytes))))
        .find(|(_, lines)| !lines.is_empty())
}

/// Match `span` against ours, theirs, both, and empty, in that order.
fn classify_span(span: &[&[u8]], c: &ConflictSegment) -> ConflictOutcome {
    if span.iter().any(|line| is_marker_line(line)) {
        return ConflictOutcome::Untouched;
    }
    let bytes = span.concat();
    let both_len = c.ours.len() + c.theirs.len();
    let resolution = if bytes == c.ours {
        Resolution::Ours
    } else if bytes == c.theirs {
        Resolution::Theirs
    } else if bytes.len() == both_len && bytes.starts_with(&c.ours) && bytes.ends_with(&c.theirs) {
        Resolution::Both
    } else if bytes.is_empty() {
        Resolution::None
    } else {
        return ConflictOutcome::Manual;
    };
    ConflictOutcome::Canonical(resolution)
}
