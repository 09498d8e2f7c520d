//! Git plumbing: conflicted-index access via `git2` and the
//! `git merge-file` merge view producer.

pub mod client;
pub mod merge_file;

pub use client::{ConflictRepo, StageFiles};
pub use merge_file::{git_available, merge_file_diff3};
