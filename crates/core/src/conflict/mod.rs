//! Line classification, whole-file conflict ranges, three-way merging, and
//! reconciliation of externally edited files.
//!
//! The conflict subsystem is responsible for:
//! 1. **Classification** -- LCS diffs of each side against the common ancestor.
//! 2. **Merging** -- producing a diff3 merge view without a `git` binary.
//! 3. **Reconciliation** -- recovering resolutions from a hand-edited file.

pub mod diff;
pub mod merger;
pub mod ranges;
pub mod reconcile;

pub use diff::{conflict_entries, diff_entries, entries_from_lines, mark_conflicted, LineCategory, LineEntry};
pub use merger::{MergeView, Merger};
pub use ranges::{classify_files, compute_conflict_ranges, mark_conflicted_in_ranges, ConflictRange, FileClassification};
pub use reconcile::{reconcile, ConflictOutcome, Reconciliation};
