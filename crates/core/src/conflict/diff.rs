//! Longest-common-subsequence line diff.
//!
//! Classifies the lines of one side relative to the common ancestor and
//! detects lines that both sides changed differently.

use std::collections::HashMap;

use serde::Serialize;

use crate::lines::split_display;
use crate::markers::ConflictSegment;

/// Classification of a single line relative to the base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineCategory {
    /// Unchanged from base.
    Equal,
    /// Present only on this side.
    Added,
    /// Present only in base.
    Removed,
    /// Replaces the base line it is paired with.
    Modified,
    /// Both sides changed the same base line differently.
    Conflicted,
}

/// One step of a classified edit script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineEntry {
    pub text: String,
    pub category: LineCategory,
    /// Base line this entry corresponds to; `None` for pure additions.
    pub base_index: Option<usize>,
}

impl LineEntry {
    fn new(text: &str, category: LineCategory, base_index: Option<usize>) -> Self {
        Self {
            text: text.to_owned(),
            category,
            base_index,
        }
    }

    /// Whether this entry changed a base line (and so can conflict).
    fn is_change(&self) -> bool {
        self.base_index.is_some()
            && matches!(self.category, LineCategory::Modified | LineCategory::Conflicted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpKind {
    Equal,
    Remove,
    Add,
}

#[derive(Debug, Clone, Copy)]
struct DiffOp<'a> {
    kind: OpKind,
    text: &'a str,
    base_index: Option<usize>,
}

/// Minimal edit script from `base` to `side` as raw ops.
///
/// The LCS table is filled backwards; the forward walk prefers removing the
/// base line on ties so output is deterministic.
fn diff_ops<'a, S: AsRef<str>>(base: &'a [S], side: &'a [S]) -> Vec<DiffOp<'a>> {
    let (n, m) = (base.len(), side.len());
    if n == 0 && m == 0 {
        return Vec::new();
    }

    let width = m + 1;
    let mut lcs = vec![0usize; (n + 1) * width];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lcs[i * width + j] = if base[i].as_ref() == side[j].as_ref() {
                lcs[(i + 1) * width + j + 1] + 1
            } else {
                lcs[(i + 1) * width + j].max(lcs[i * width + j + 1])
            };
        }
    }

    let mut ops = Vec::with_capacity(n + m);
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if base[i].as_ref() == side[j].as_ref() {
            ops.push(DiffOp {
                kind: OpKind::Equal,
                text: base[i].as_ref(),
                base_index: Some(i),
            });
            i += 1;
            j += 1;
        } else if lcs[(i + 1) * width + j] >= lcs[i * width + j + 1] {
            ops.push(DiffOp {
                kind: OpKind::Remove,
                text: base[i].as_ref(),
                base_index: Some(i),
            });
            i += 1;
        } else {
            ops.push(DiffOp {
                kind: OpKind::Add,
                text: side[j].as_ref(),
                base_index: None,
            });
            j += 1;
        }
    }
    ops.extend((i..n).map(|i| DiffOp {
        kind: OpKind::Remove,
        text: base[i].as_ref(),
        base_index: Some(i),
    }));
    ops.extend((j..m).map(|j| DiffOp {
        kind: OpKind::Add,
        text: side[j].as_ref(),
        base_index: None,
    }));
    ops
}

/// Classified edit script from `base` to `side`.
///
/// An addition directly after a removal replaces that removal with a single
/// `Modified` entry carrying the removed line's base index.
pub fn diff_entries<S: AsRef<str>>(base: &[S], side: &[S]) -> Vec<LineEntry> {
    let ops = diff_ops(base, side);
    let mut entries = Vec::with_capacity(ops.len());
    let mut last_removed: Option<usize> = None;

    for op in ops {
        match op.kind {
            OpKind::Equal => {
                entries.push(LineEntry::new(op.text, LineCategory::Equal, op.base_index));
                last_removed = None;
            }
            OpKind::Remove => {
                entries.push(LineEntry::new(op.text, LineCategory::Removed, op.base_index));
                last_removed = op.base_index;
            }
            OpKind::Add => match last_removed.take() {
                Some(idx) => {
                    entries.pop();
                    entries.push(LineEntry::new(op.text, LineCategory::Modified, Some(idx)));
                }
                None => entries.push(LineEntry::new(op.text, LineCategory::Added, None)),
            },
        }
    }
    entries
}

/// Flag lines that both sides changed differently.
///
/// For every base index changed on both sides whose resulting text differs,
/// both entries become `Conflicted`. Lines left equal to base on one side
/// never conflict.
pub fn mark_conflicted(ours: &mut [LineEntry], theirs: &mut [LineEntry]) {
    let ours_map = change_map(ours, |_| true);
    let theirs_map = change_map(theirs, |_| true);
    apply_conflicts(ours, theirs, &ours_map, &theirs_map);
}

/// Map base index → entry position for changed entries accepted by `keep`.
pub(crate) fn change_map(
    entries: &[LineEntry],
    keep: impl Fn(usize) -> bool,
) -> HashMap<usize, usize> {
    entries
        .iter()
        .enumerate()
        .filter(|(_, e)| e.is_change())
        .filter_map(|(pos, e)| e.base_index.map(|b| (b, pos)))
        .filter(|(b, _)| keep(*b))
        .collect()
}

pub(crate) fn apply_conflicts(
    ours: &mut [LineEntry],
    theirs: &mut [LineEntry],
    ours_map: &HashMap<usize, usize>,
    theirs_map: &HashMap<usize, usize>,
) {
    for (base_index, &o) in ours_map {
        let Some(&t) = theirs_map.get(base_index) else {
            continue;
        };
        if ours[o].text != theirs[t].text {
            ours[o].category = LineCategory::Conflicted;
            theirs[t].category = LineCategory::Conflicted;
        }
    }
}

/// Entries with every line tagged `category` and no base index.
pub fn entries_from_lines<S: AsRef<str>>(lines: &[S], category: LineCategory) -> Vec<LineEntry> {
    lines
        .iter()
        .map(|l| LineEntry::new(l.as_ref(), category, None))
        .collect()
}

/// Classified ours/theirs entries for a single conflict.
///
/// Without a base section every line of both sides is `Conflicted`.
pub fn conflict_entries(seg: &ConflictSegment) -> (Vec<LineEntry>, Vec<LineEntry>) {
    let ours_lines = split_display(&seg.ours);
    let theirs_lines = split_display(&seg.theirs);

    let Some(base) = &seg.base else {
        return (
            entries_from_lines(&ours_lines, LineCategory::Conflicted),
            entries_from_lines(&theirs_lines, LineCategory::Conflicted),
        );
    };

    let base_lines = split_display(base);
    let mut ours = diff_entries(&base_lines, &ours_lines);
    let mut theirs = diff_entries(&base_lines, &theirs_lines);
    mark_conflicted(&mut ours, &mut theirs);
    (ours, theirs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cats(entries: &[LineEntry]) -> Vec<LineCategory> {
        entries.iter().map(|e| e.category).collect()
    }

    #[test]
    fn test_substitution_is_modified() {
        let entries = diff_entries(&["a", "b"], &["a", "b2"]);
        assert_eq!(
            entries,
            vec![
                LineEntry::new("a", LineCategory::Equal, Some(0)),
                LineEntry::new("b2", LineCategory::Modified, Some(1)),
            ]
        );
    }

    #[test]
    fn test_equal_and_removed_carry_base_index() {
        let entries = diff_entries(&["a", "b", "c"], &["a", "c"]);
        assert_eq!(
            cats(&entries),
            vec![LineCategory::Equal, LineCategory::Removed, LineCategory::Equal]
        );
        assert_eq!(entries[1].base_index, Some(1));
        assert_eq!(entries[2].base_index, Some(2));
    }

    #[test]
    fn test_pure_addition_is_untagged() {
        let entries = diff_entries(&["a"], &["a", "new"]);
        assert_eq!(entries[1].category, LineCategory::Added);
        assert_eq!(entries[1].base_index, None);
    }

    #[test]
    fn test_only_first_addition_after_removal_pairs() {
        let entries = diff_entries(&["a", "b", "c"], &["a", "x", "y", "c"]);
        assert_eq!(
            cats(&entries),
            vec![
                LineCategory::Equal,
                LineCategory::Modified,
                LineCategory::Added,
                LineCategory::Equal,
            ]
        );
        assert_eq!(entries[1].base_index, Some(1));
    }

    #[test]
    fn test_consecutive_removals_pair_with_last() {
        let entries = diff_entries(&["p", "q"], &["z"]);
        assert_eq!(
            entries,
            vec![
                LineEntry::new("p", LineCategory::Removed, Some(0)),
                LineEntry::new("z", LineCategory::Modified, Some(1)),
            ]
        );
    }

    #[test]
    fn test_empty_inputs() {
        assert!(diff_entries::<&str>(&[], &[]).is_empty());
        assert_eq!(cats(&diff_entries(&[], &["x"])), vec![LineCategory::Added]);
        assert_eq!(cats(&diff_entries(&["x"], &[])), vec![LineCategory::Removed]);
    }

    #[test]
    fn test_both_sides_change_same_line() {
        let mut ours = diff_entries(&["x"], &["y"]);
        let mut theirs = diff_entries(&["x"], &["z"]);
        mark_conflicted(&mut ours, &mut theirs);
        assert_eq!(ours, vec![LineEntry::new("y", LineCategory::Conflicted, Some(0))]);
        assert_eq!(theirs, vec![LineEntry::new("z", LineCategory::Conflicted, Some(0))]);
    }

    #[test]
    fn test_one_side_unchanged_is_not_conflicted() {
        let mut ours = diff_entries(&["x"], &["y"]);
        let mut theirs = diff_entries(&["x"], &["x"]);
        mark_conflicted(&mut ours, &mut theirs);
        assert_eq!(ours, vec![LineEntry::new("y", LineCategory::Modified, Some(0))]);
        assert_eq!(cats(&theirs), vec![LineCategory::Equal]);
    }

    #[test]
    fn test_identical_changes_do_not_conflict() {
        let mut ours = diff_entries(&["x"], &["same"]);
        let mut theirs = diff_entries(&["x"], &["same"]);
        mark_conflicted(&mut ours, &mut theirs);
        assert!(!ours.iter().any(|e| e.category == LineCategory::Conflicted));
    }

    #[test]
    fn test_conflict_entries_without_base() {
        let seg = ConflictSegment::new("a\nb\n", None, "c\n");
        let (ours, theirs) = conflict_entries(&seg);
        assert_eq!(cats(&ours), vec![LineCategory::Conflicted; 2]);
        assert_eq!(cats(&theirs), vec![LineCategory::Conflicted]);
    }

    #[test]
    fn test_conflict_entries_with_empty_base() {
        let seg = ConflictSegment::new("a\n", Some(Vec::new()), "c\n");
        let (ours, theirs) = conflict_entries(&seg);
        assert_eq!(cats(&ours), vec![LineCategory::Added]);
        assert_eq!(cats(&theirs), vec![LineCategory::Added]);
    }

    #[test]
    fn test_conflict_entries_with_base() {
        let seg = ConflictSegment::new("keep\nours\n", Some(b"keep\nbase\n".to_vec()), "keep\ntheirs\n");
        let (ours, theirs) = conflict_entries(&seg);
        assert_eq!(ours[0].category, LineCategory::Equal);
        assert!(ours.iter().any(|e| e.text == "ours" && e.category == LineCategory::Conflicted));
        assert!(theirs.iter().any(|e| e.text == "theirs" && e.category == LineCategory::Conflicted));
    }
}
