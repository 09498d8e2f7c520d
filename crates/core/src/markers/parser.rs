//! Strict conflict-marker parser.
//!
//! Turns a diff3-style merge view into a [`Document`]. A start marker must be
//! followed by a complete block (optionally with a base section); there is no
//! recovery mode that treats stray markers as text.

use tracing::debug;

use super::types::{ConflictSegment, Document, MarkerLines, Resolution, Segment, TextSegment};
use crate::errors::MarkerError;
use crate::lines::split_keep_eol;

pub const MARK_START: &[u8] = b"<<<<<<<";
pub const MARK_BASE: &[u8] = b"|||||||";
pub const MARK_MID: &[u8] = b"=======";
pub const MARK_END: &[u8] = b">>>>>>>";

/// All four marker prefixes.
pub const MARKERS: [&[u8]; 4] = [MARK_START, MARK_BASE, MARK_MID, MARK_END];

/// Whether `line` starts with any conflict marker prefix.
pub fn is_marker_line(line: &[u8]) -> bool {
    MARKERS.iter().any(|m| line.starts_with(m))
}

/// Parse `data` into segments and conflicts.
pub fn parse(data: &[u8]) -> Result<Document, MarkerError> {
    let lines = split_keep_eol(data);
    let mut segments = Vec::new();
    let mut text = Vec::new();

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        if !line.starts_with(MARK_START) {
            text.extend_from_slice(line);
            i += 1;
            continue;
        }

        flush_text(&mut segments, &mut text);
        let start_line = i + 1;
        let start_marker = line;

        // Ours runs until a base or mid marker.
        i += 1;
        let mut ours = Vec::new();
        while i < lines.len() && !lines[i].starts_with(MARK_BASE) && !lines[i].starts_with(MARK_MID) {
            ours.extend_from_slice(lines[i]);
            i += 1;
        }
        if i >= lines.len() {
            return Err(MarkerError::MissingSeparator { line: start_line });
        }

        let mut base = None;
        let mut base_marker = None;
        if lines[i].starts_with(MARK_BASE) {
            base_marker = Some(lines[i]);
            i += 1;
            let mut collected = Vec::new();
            while i < lines.len() && !lines[i].starts_with(MARK_MID) {
                collected.extend_from_slice(lines[i]);
                i += 1;
            }
            if i >= lines.len() {
                return Err(MarkerError::MissingMidAfterBase { line: start_line });
            }
            base = Some(collected);
        }

        if !lines[i].starts_with(MARK_MID) {
            return Err(MarkerError::ExpectedMid { line: start_line });
        }
        let mid_marker = lines[i];

        i += 1;
        let mut theirs = Vec::new();
        while i < lines.len() && !lines[i].starts_with(MARK_END) {
            theirs.extend_from_slice(lines[i]);
            i += 1;
        }
        if i >= lines.len() {
            return Err(MarkerError::MissingEnd { line: start_line });
        }
        let end_marker = lines[i];
        i += 1;

        segments.push(Segment::Conflict(ConflictSegment {
            ours,
            base,
            theirs,
            ours_label: parse_label(start_marker, MARK_START),
            base_label: base_marker.and_then(|m| parse_label(m, MARK_BASE)),
            theirs_label: parse_label(end_marker, MARK_END),
            markers: Some(MarkerLines {
                start: start_marker.to_vec(),
                base: base_marker.map(<[u8]>::to_vec),
                mid: mid_marker.to_vec(),
                end: end_marker.to_vec(),
            }),
            resolution: Resolution::Unset,
        }));
    }
    flush_text(&mut segments, &mut text);

    let doc = Document::from_segments(segments);
    debug!(
        segments = doc.segments().len(),
        conflicts = doc.conflict_count(),
        "parsed conflict markers"
    );
    Ok(doc)
}

/// True when `data` parses and contains no conflict blocks.
///
/// Malformed input is not considered resolved.
pub fn is_resolved(data: &[u8]) -> bool {
    matches!(parse(data), Ok(doc) if !doc.has_conflicts())
}

fn flush_text(segments: &mut Vec<Segment>, text: &mut Vec<u8>) {
    if !text.is_empty() {
        segments.push(Segment::Text(TextSegment {
            bytes: std::mem::take(text),
        }));
    }
}

/// Trailing text after the marker prefix, whitespace-trimmed; `None` if empty.
fn parse_label(line: &[u8], prefix: &[u8]) -> Option<String> {
    let rest = line.strip_prefix(prefix)?;
    let label = String::from_utf8_lossy(rest).trim().to_string();
    (!label.is_empty()).then_some(label)
}
