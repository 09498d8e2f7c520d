//! In-process three-way merge producing a diff3-style merge view.
//!
//! Uses the `diffy` crate so a merge view can be built without a `git`
//! binary. Conflict blocks always carry a `|||||||` base section.

use tracing::{debug, info};

/// Output of a three-way merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeView {
    /// Merged bytes; contains conflict markers when `has_conflicts` is true.
    pub bytes: Vec<u8>,
    pub has_conflicts: bool,
}

impl MergeView {
    fn clean(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
            has_conflicts: false,
        }
    }
}

/// Stateless three-way merge engine.
pub struct Merger;

impl Merger {
    /// Merge `ours` and `theirs` against `base` with diff3 conflict style.
    pub fn diff3_view(base: &[u8], ours: &[u8], theirs: &[u8]) -> MergeView {
        info!("performing builtin three-way merge");

        // Fast paths: one side unchanged, or both sides identical.
        if ours == base || ours == theirs {
            debug!("ours == base or ours == theirs, theirs wins cleanly");
            return MergeView::clean(theirs);
        }
        if theirs == base {
            debug!("theirs == base, ours wins cleanly");
            return MergeView::clean(ours);
        }

        let mut options = diffy::MergeOptions::new();
        options.set_conflict_style(diffy::ConflictStyle::Diff3);
        match options.merge_bytes(base, ours, theirs) {
            Ok(merged) => {
                debug!("clean builtin merge");
                MergeView {
                    bytes: merged,
                    has_conflicts: false,
                }
            }
            Err(conflicted) => {
                debug!(bytes = conflicted.len(), "builtin merge produced conflicts");
                MergeView {
                    bytes: conflicted,
                    has_conflicts: true,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markers::parse;

    #[test]
    fn test_identical_files() {
        let base = b"line1\nline2\nline3\n";
        let view = Merger::diff3_view(base, base, base);
        assert!(!view.has_conflicts);
        assert_eq!(view.bytes, base);
    }

    #[test]
    fn test_only_one_side_changed() {
        let base = b"line1\nline2\nline3\n";
        let changed = b"line1\nmodified\nline3\n";
        assert_eq!(Merger::diff3_view(base, changed, base).bytes, changed);
        assert_eq!(Merger::diff3_view(base, base, changed).bytes, changed);
    }

    #[test]
    fn test_non_overlapping_changes() {
        let base = b"line1\nline2\nline3\nline4\nline5\nline6\nline7\nline8\n";
        let ours = b"LINE1\nline2\nline3\nline4\nline5\nline6\nline7\nline8\n";
        let theirs = b"line1\nline2\nline3\nline4\nline5\nline6\nline7\nLINE8\n";
        let view = Merger::diff3_view(base, ours, theirs);
        assert!(!view.has_conflicts);
        let text = String::from_utf8(view.bytes).unwrap();
        assert!(text.contains("LINE1"));
        assert!(text.contains("LINE8"));
    }

    #[test]
    fn test_conflicting_changes_parse_with_base() {
        let base = b"line1\noriginal\nline3\n";
        let ours = b"line1\nours_version\nline3\n";
        let theirs = b"line1\ntheirs_version\nline3\n";
        let view = Merger::diff3_view(base, ours, theirs);
        assert!(view.has_conflicts);

        let doc = parse(&view.bytes).unwrap();
        assert_eq!(doc.conflict_count(), 1);
        let c = doc.conflict(0).unwrap();
        assert_eq!(c.ours, b"ours_version\n");
        assert_eq!(c.base.as_deref(), Some(&b"original\n"[..]));
        assert_eq!(c.theirs, b"theirs_version\n");
    }

    #[test]
    fn test_same_change_both_sides() {
        let view = Merger::diff3_view(b"old\n", b"new\n", b"new\n");
        assert!(!view.has_conflicts);
        assert_eq!(view.bytes, b"new\n");
    }
}
