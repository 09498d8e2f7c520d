//! Whole-file classification.
//!
//! Diffs LOCAL and REMOTE against BASE once, then restricts conflict marking
//! to the line ranges each conflict occupies in those files.

use std::ops::Range;

use serde::Serialize;
use tracing::debug;

use super::diff::{apply_conflicts, change_map, diff_entries, LineCategory, LineEntry};
use crate::errors::DiffError;
use crate::lines::{find_subslice, split_display};
use crate::markers::Document;

/// Line ranges of one conflict inside the full base/ours/theirs files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictRange {
    /// `None` when the conflict has no base section.
    pub base: Option<Range<usize>>,
    pub ours: Range<usize>,
    pub theirs: Range<usize>,
}

/// Locate every conflict's chunks inside the full-file line arrays.
///
/// Each side keeps its own cursor, so chunks are matched in order and never
/// overlap or move backwards.
pub fn compute_conflict_ranges<S: AsRef<str>>(
    doc: &Document,
    base_lines: &[S],
    ours_lines: &[S],
    theirs_lines: &[S],
) -> Result<Vec<ConflictRange>, DiffError> {
    let base_full = as_strs(base_lines);
    let ours_full = as_strs(ours_lines);
    let theirs_full = as_strs(theirs_lines);

    let (mut base_pos, mut ours_pos, mut theirs_pos) = (0, 0, 0);
    let mut ranges = Vec::with_capacity(doc.conflict_count());

    for (index, c) in doc.conflicts().enumerate() {
        let ours = locate(&ours_full, &mut ours_pos, &c.ours, index, "ours")?;
        let theirs = locate(&theirs_full, &mut theirs_pos, &c.theirs, index, "theirs")?;
        let base = match &c.base {
            Some(chunk) => Some(locate(&base_full, &mut base_pos, chunk, index, "base")?),
            None => None,
        };
        ranges.push(ConflictRange { base, ours, theirs });
    }

    debug!(conflicts = ranges.len(), "computed conflict ranges");
    Ok(ranges)
}

fn as_strs<S: AsRef<str>>(lines: &[S]) -> Vec<&str> {
    lines.iter().map(AsRef::as_ref).collect()
}

fn locate(
    full: &[&str],
    cursor: &mut usize,
    chunk: &[u8],
    conflict: usize,
    side: &'static str,
) -> Result<Range<usize>, DiffError> {
    let chunk_lines = split_display(chunk);
    let needle = as_strs(&chunk_lines);
    let start = find_subslice(full, *cursor, &needle)
        .ok_or(DiffError::ChunkNotFound { conflict, side })?;
    let end = start + needle.len();
    *cursor = end;
    Ok(start..end)
}

/// Position of each entry within its side's file, `None` for removed lines.
///
/// Every non-removed entry corresponds to exactly one side line, in order.
fn side_positions(entries: &[LineEntry]) -> Vec<Option<usize>> {
    let mut next = 0;
    entries
        .iter()
        .map(|e| {
            if e.category == LineCategory::Removed {
                None
            } else {
                next += 1;
                Some(next - 1)
            }
        })
        .collect()
}

/// Conflict marking restricted to each conflict's ranges.
///
/// With a base range, only base indices inside it are compared. Without
/// one, every entry whose side line falls in the conflict's range is marked
/// `Conflicted`.
pub fn mark_conflicted_in_ranges(
    ours: &mut [LineEntry],
    theirs: &mut [LineEntry],
    ranges: &[ConflictRange],
) {
    let ours_pos = side_positions(ours);
    let theirs_pos = side_positions(theirs);

    for range in ranges {
        match &range.base {
            Some(base) => {
                let ours_map = change_map(ours, |b| base.contains(&b));
                let theirs_map = change_map(theirs, |b| base.contains(&b));
                apply_conflicts(ours, theirs, &ours_map, &theirs_map);
            }
            None => {
                mark_span(ours, &ours_pos, &range.ours);
                mark_span(theirs, &theirs_pos, &range.theirs);
            }
        }
    }
}

fn mark_span(entries: &mut [LineEntry], positions: &[Option<usize>], span: &Range<usize>) {
    for (entry, pos) in entries.iter_mut().zip(positions) {
        if pos.is_some_and(|p| span.contains(&p)) {
            entry.category = LineCategory::Conflicted;
        }
    }
}

/// Classified LOCAL and REMOTE files plus the ranges used to mark them.
#[derive(Debug, Clone, Serialize)]
pub struct FileClassification {
    pub ours: Vec<LineEntry>,
    pub theirs: Vec<LineEntry>,
    pub ranges: Vec<ConflictRange>,
}

/// Diff both sides against base over whole files and mark conflicted lines.
pub fn classify_files(
    doc: &Document,
    base: &[u8],
    ours: &[u8],
    theirs: &[u8],
) -> Result<FileClassification, DiffError> {
    let base_lines = split_display(base);
    let ours_lines = split_display(ours);
    let theirs_lines = split_display(theirs);

    let ranges = compute_conflict_ranges(doc, &base_lines, &ours_lines, &theirs_lines)?;
    let mut ours = diff_entries(&base_lines, &ours_lines);
    let mut theirs = diff_entries(&base_lines, &theirs_lines);
    mark_conflicted_in_ranges(&mut ours, &mut theirs, &ranges);

    Ok(FileClassification {
        ours,
        theirs,
        ranges,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markers::{parse, ConflictSegment, Segment, TextSegment};

    fn text(s: &str) -> Segment {
        Segment::Text(TextSegment {
            bytes: s.as_bytes().to_vec(),
        })
    }

    #[test]
    fn test_ranges_follow_chunks_in_order() {
        let view = "a\n<<<<<<< L\ny\n||||||| B\nx\n=======\nz\n>>>>>>> R\nc\n<<<<<<< L\ny\n||||||| B\nx\n=======\nw\n>>>>>>> R\n";
        let doc = parse(view.as_bytes()).unwrap();
        let base = ["a", "x", "c", "x"];
        let ours = ["a", "y", "c", "y"];
        let theirs = ["a", "z", "c", "w"];

        let ranges = compute_conflict_ranges(&doc, &base, &ours, &theirs).unwrap();
        assert_eq!(
            ranges,
            vec![
                ConflictRange {
                    base: Some(1..2),
                    ours: 1..2,
                    theirs: 1..2
                },
                ConflictRange {
                    base: Some(3..4),
                    ours: 3..4,
                    theirs: 3..4
                },
            ]
        );
    }

    #[test]
    fn test_missing_chunk_is_an_error() {
        let doc = Document::from_segments(vec![Segment::Conflict(ConflictSegment::new(
            "missing\n",
            None,
            "b\n",
        ))]);
        let err = compute_conflict_ranges(&doc, &["a"], &["a"], &["b"]).unwrap_err();
        assert_eq!(
            err,
            DiffError::ChunkNotFound {
                conflict: 0,
                side: "ours"
            }
        );
    }

    #[test]
    fn test_empty_chunk_is_empty_range_at_cursor() {
        let doc = Document::from_segments(vec![
            text("a\n"),
            Segment::Conflict(ConflictSegment::new("", Some(Vec::new()), "t\n")),
        ]);
        let ranges = compute_conflict_ranges(&doc, &["a"], &["a"], &["a", "t"]).unwrap();
        assert_eq!(ranges[0].ours, 0..0);
        assert_eq!(ranges[0].base, Some(0..0));
        assert_eq!(ranges[0].theirs, 1..2);
    }

    #[test]
    fn test_marking_is_limited_to_conflict_ranges() {
        // Line 0 changed on both sides but sits outside any conflict.
        let doc = Document::from_segments(vec![
            text("k\n"),
            Segment::Conflict(ConflictSegment::new("y\n", Some(b"x\n".to_vec()), "z\n")),
        ]);
        let base = b"a\nk\nx\n";
        let ours = b"q\nk\ny\n";
        let theirs = b"r\nk\nz\n";

        let classified = classify_files(&doc, base, ours, theirs).unwrap();
        let cats: Vec<LineCategory> = classified.ours.iter().map(|e| e.category).collect();
        assert_eq!(
            cats,
            vec![
                LineCategory::Modified,
                LineCategory::Equal,
                LineCategory::Conflicted
            ]
        );
        assert_eq!(classified.theirs[2].text, "z");
        assert_eq!(classified.theirs[2].category, LineCategory::Conflicted);
        assert_eq!(classified.theirs[0].category, LineCategory::Modified);
    }

    #[test]
    fn test_two_way_conflict_marks_side_ranges() {
        let view = "keep\n<<<<<<< L\no1\no2\n=======\nt1\n>>>>>>> R\n";
        let doc = parse(view.as_bytes()).unwrap();
        let classified = classify_files(&doc, b"keep\n", b"keep\no1\no2\n", b"keep\nt1\n").unwrap();

        assert_eq!(classified.ranges[0].base, None);
        assert_eq!(classified.ours[0].category, LineCategory::Equal);
        assert_eq!(classified.ours[1].category, LineCategory::Conflicted);
        assert_eq!(classified.ours[2].category, LineCategory::Conflicted);
        assert_eq!(classified.theirs[1].category, LineCategory::Conflicted);
    }

    #[test]
    fn test_side_positions_skip_removed() {
        let entries = diff_entries(&["a", "b", "c"], &["a", "c"]);
        assert_eq!(side_positions(&entries), vec![Some(0), None, Some(1)]);
    }
}
