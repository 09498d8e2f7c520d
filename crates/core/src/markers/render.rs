//! Document → bytes.
//!
//! Strict rendering requires every conflict to be resolved (or manually
//! resolved); permissive rendering re-emits unresolved blocks verbatim so
//! the output parses back into the same conflict structure.

use super::parser::{MARK_BASE, MARK_END, MARK_MID, MARK_START};
use super::types::{ConflictSegment, Document, ManualResolutions, Resolution, Segment};
use crate::errors::RenderError;

/// How unresolved conflicts are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Fail on the first unresolved conflict.
    Strict,
    /// Re-emit unresolved conflicts as marker blocks.
    Permissive,
}

/// Render with every conflict resolved; fails on the first `Unset` one.
pub fn render_resolved(doc: &Document) -> Result<Vec<u8>, RenderError> {
    render(doc, &ManualResolutions::new(), RenderMode::Strict)
}

/// Render, keeping unresolved conflicts as their original marker blocks.
pub fn render_with_unresolved(doc: &Document) -> Vec<u8> {
    render_permissive(doc, &ManualResolutions::new())
}

/// Permissive rendering never fails.
pub fn render_permissive(doc: &Document, manual: &ManualResolutions) -> Vec<u8> {
    let mut out = Vec::new();
    let mut conflict_index = 0;
    for seg in doc.segments() {
        match seg {
            Segment::Text(t) => out.extend_from_slice(&t.bytes),
            Segment::Conflict(c) => {
                if !write_resolved(&mut out, c, manual.get(&conflict_index)) {
                    write_marker_block(&mut out, c);
                }
                conflict_index += 1;
            }
        }
    }
    out
}

/// Render `doc` in `mode`. Manual entries take priority over resolutions.
pub fn render(
    doc: &Document,
    manual: &ManualResolutions,
    mode: RenderMode,
) -> Result<Vec<u8>, RenderError> {
    if mode == RenderMode::Permissive {
        return Ok(render_permissive(doc, manual));
    }

    let mut out = Vec::new();
    let mut conflict_index = 0;
    for seg in doc.segments() {
        match seg {
            Segment::Text(t) => out.extend_from_slice(&t.bytes),
            Segment::Conflict(c) => {
                if !write_resolved(&mut out, c, manual.get(&conflict_index)) {
                    return Err(RenderError::Unresolved {
                        conflict: conflict_index,
                    });
                }
                conflict_index += 1;
            }
        }
    }
    Ok(out)
}

/// Append the resolved content of `c`; false when it is unresolved.
fn write_resolved(out: &mut Vec<u8>, c: &ConflictSegment, manual: Option<&Vec<u8>>) -> bool {
    if let Some(bytes) = manual {
        out.extend_from_slice(bytes);
        return true;
    }
    match c.resolution() {
        Resolution::Unset => return false,
        Resolution::Ours => out.extend_from_slice(&c.ours),
        Resolution::Theirs => out.extend_from_slice(&c.theirs),
        Resolution::Both => {
            out.extend_from_slice(&c.ours);
            out.extend_from_slice(&c.theirs);
        }
        Resolution::None => {}
    }
    true
}

/// Append the full marker block of `c`, using the parsed marker lines when
/// available and synthesizing `<prefix> <label>\n` otherwise.
fn write_marker_block(out: &mut Vec<u8>, c: &ConflictSegment) {
    match &c.markers {
        Some(m) => {
            out.extend_from_slice(&m.start);
            out.extend_from_slice(&c.ours);
            if let Some(base) = &c.base {
                match &m.base {
                    Some(line) => out.extend_from_slice(line),
                    None => synth_marker(out, MARK_BASE, c.base_label.as_deref()),
                }
                out.extend_from_slice(base);
            }
            out.extend_from_slice(&m.mid);
            out.extend_from_slice(&c.theirs);
            out.extend_from_slice(&m.end);
        }
        None => {
            synth_marker(out, MARK_START, c.ours_label.as_deref());
            out.extend_from_slice(&c.ours);
            if let Some(base) = &c.base {
                synth_marker(out, MARK_BASE, c.base_label.as_deref());
                out.extend_from_slice(base);
            }
            synth_marker(out, MARK_MID, None);
            out.extend_from_slice(&c.theirs);
            synth_marker(out, MARK_END, c.theirs_label.as_deref());
        }
    }
}

fn synth_marker(out: &mut Vec<u8>, prefix: &[u8], label: Option<&str>) {
    out.extend_from_slice(prefix);
    if let Some(label) = label.filter(|l| !l.is_empty()) {
        out.push(b' ');
        out.extend_from_slice(label.as_bytes());
    }
    out.push(b'\n');
}
