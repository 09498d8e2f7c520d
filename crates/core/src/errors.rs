//! Error types for the easy-conflict core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them all for callers that want a
//! single error type.

use thiserror::Error;

use crate::markers::{Resolution, UnknownResolution};

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Marker(#[from] MarkerError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error(transparent)]
    Diff(#[from] DiffError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Script(#[from] ScriptError),
}

// ---------------------------------------------------------------------------
// Marker parsing errors
// ---------------------------------------------------------------------------

/// Malformed conflict-marker input.
///
/// Every variant aborts the whole parse; `line` is the 1-based line number of
/// the `<<<<<<<` marker that opened the broken block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkerError {
    /// End of input while collecting the ours section.
    #[error("malformed conflict markers: missing separator for conflict starting at line {line}")]
    MissingSeparator { line: usize },

    /// End of input while collecting the base section.
    #[error("malformed conflict markers: missing ======= after base for conflict starting at line {line}")]
    MissingMidAfterBase { line: usize },

    /// The line in mid-marker position is not a mid marker.
    ///
    /// Kept for the malformed-input taxonomy; the current grammar only leaves
    /// the base section on a mid marker, so the parser never raises it.
    #[error("malformed conflict markers: expected ======= for conflict starting at line {line}")]
    ExpectedMid { line: usize },

    /// End of input while collecting the theirs section.
    #[error("malformed conflict markers: missing end marker for conflict starting at line {line}")]
    MissingEnd { line: usize },
}

// ---------------------------------------------------------------------------
// Resolution state errors
// ---------------------------------------------------------------------------

/// Invalid operations against the resolution state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// History depth must be at least one.
    #[error("history depth must be >= 1, got {0}")]
    InvalidDepth(usize),

    /// Conflict index outside `[0, len)`.
    #[error("conflict index {index} out of bounds [0, {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// `Unset` cannot be applied; only undo restores it.
    #[error("invalid resolution: {0}")]
    InvalidResolution(Resolution),

    #[error("no undo history available")]
    NothingToUndo,

    #[error("no redo history available")]
    NothingToRedo,
}

// ---------------------------------------------------------------------------
// Render errors
// ---------------------------------------------------------------------------

/// Errors from the strict renderer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// A conflict has no resolution and no manual entry.
    #[error("unresolved: conflict {conflict} has no resolution")]
    Unresolved { conflict: usize },
}

// ---------------------------------------------------------------------------
// Reconciliation errors
// ---------------------------------------------------------------------------

/// The edited file could not be aligned with the document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    /// A text segment's lines were not found at or after the cursor.
    #[error("failed to align text segment {segment} with the edited file")]
    TextSegmentNotFound { segment: usize },
}

// ---------------------------------------------------------------------------
// Diff errors
// ---------------------------------------------------------------------------

/// Errors from locating conflict chunks inside full-file line arrays.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiffError {
    #[error("{side} chunk of conflict {conflict} not found in the full {side} file")]
    ChunkNotFound { conflict: usize, side: &'static str },
}

// ---------------------------------------------------------------------------
// Script errors
// ---------------------------------------------------------------------------

/// A single script command that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("'{command}' expects {expected}")]
    WrongArity {
        command: String,
        expected: &'static str,
    },

    #[error("invalid conflict index '{0}'")]
    InvalidIndex(String),

    #[error(transparent)]
    InvalidResolution(#[from] UnknownResolution),
}

/// A resolution script failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    #[error("script line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: CommandError,
    },
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue { field: String, detail: String },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Git errors
// ---------------------------------------------------------------------------

/// Errors from git2 repository access and the `git merge-file` backend.
#[derive(Debug, Error)]
pub enum GitError {
    /// No repository contains the given directory.
    #[error("git repository not found from '{0}'")]
    RepositoryNotFound(String),

    /// A `git2` library error.
    #[error("git2 error: {0}")]
    Git2Error(#[from] git2::Error),

    /// The index has no entry for the requested stage.
    #[error("stage {stage} missing for '{path}'")]
    StageMissing { path: String, stage: u8 },

    /// The `git` binary was not found on `$PATH`.
    #[error("git binary not found: {0}")]
    BinaryNotFound(String),

    /// `git merge-file` exited outside 0..=127 or was killed.
    #[error("git merge-file failed (exit {exit_code}): {stderr}")]
    MergeFileFailed { exit_code: i32, stderr: String },

    /// Generic I/O wrapper.
    #[error("git I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Session errors
// ---------------------------------------------------------------------------

/// Errors from the file-level resolution workflow.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A conflict of the merge view lacks a diff3 base section.
    #[error("conflict {0} is missing base chunk (base display requires an exact base for all conflicts)")]
    MissingBase(usize),

    /// The regenerated merge view has no conflicts while MERGED still has some.
    #[error("computed diff3 view has no conflicts but {0} contains conflict markers")]
    ViewHasNoConflicts(String),

    /// A strict render still parsed back into conflicts.
    #[error("resolution output still contains conflict markers")]
    StillConflicted,

    /// A file could not be read or written.
    #[error("{action} '{path}': {source}")]
    Io {
        action: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The external editor failed.
    #[error("editor '{editor}' failed: {detail}")]
    EditorFailed { editor: String, detail: String },

    #[error(transparent)]
    Marker(#[from] MarkerError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error(transparent)]
    Diff(#[from] DiffError),

    #[error(transparent)]
    Git(#[from] GitError),
}

impl SessionError {
    pub(crate) fn io(action: &'static str, path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.display().to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = MarkerError::MissingEnd { line: 3 };
        assert_eq!(
            err.to_string(),
            "malformed conflict markers: missing end marker for conflict starting at line 3"
        );

        let err = StateError::IndexOutOfRange { index: 4, len: 2 };
        assert_eq!(err.to_string(), "conflict index 4 out of bounds [0, 2)");

        let err = StateError::InvalidResolution(Resolution::Unset);
        assert_eq!(err.to_string(), "invalid resolution: unset");

        let err = RenderError::Unresolved { conflict: 1 };
        assert!(err.to_string().starts_with("unresolved"));

        let err = DiffError::ChunkNotFound {
            conflict: 0,
            side: "ours",
        };
        assert!(err.to_string().contains("ours chunk of conflict 0"));
    }

    #[test]
    fn test_core_error_from_subsystem() {
        let core_err: CoreError = MarkerError::MissingSeparator { line: 1 }.into();
        assert!(matches!(core_err, CoreError::Marker(_)));

        let core_err: CoreError = StateError::NothingToUndo.into();
        assert!(matches!(core_err, CoreError::State(_)));

        let core_err: CoreError = ReconcileError::TextSegmentNotFound { segment: 2 }.into();
        assert!(matches!(core_err, CoreError::Reconcile(_)));
    }

    #[test]
    fn test_session_error_wraps_subsystems() {
        let err: SessionError = RenderError::Unresolved { conflict: 0 }.into();
        assert!(matches!(err, SessionError::Render(_)));
        assert!(err.to_string().contains("conflict 0"));
    }
}
