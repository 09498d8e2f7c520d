//! File-level resolution workflow.
//!
//! A [`Session`] binds BASE/LOCAL/REMOTE/MERGED paths to a parsed merge view,
//! its [`ResolutionState`] and the manual-resolution map recovered from an
//! edited MERGED file.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use serde::Serialize;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

use super::base::validate_base_completeness;
use super::script::ScriptCommand;
use super::state::ResolutionState;
use crate::config::{MergeBackend, ResolverConfig};
use crate::conflict::{classify_files, reconcile, FileClassification, Merger};
use crate::errors::{RenderError, SessionError};
use crate::git::merge_file_diff3;
use crate::markers::{
    parse, render, render_permissive, Document, ManualResolutions, RenderMode, Resolution,
};

/// The four files of a merge-tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeInputs {
    pub base: PathBuf,
    pub local: PathBuf,
    pub remote: PathBuf,
    pub merged: PathBuf,
}

/// Where a conflict stands, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "resolution", rename_all = "snake_case")]
pub enum ConflictStatus {
    Resolved(Resolution),
    Manual,
    Unresolved,
}

/// Result of [`Session::write`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Every conflict was resolved; MERGED is clean.
    Resolved,
    /// Unresolved conflicts were written back as marker blocks.
    Partial { unresolved: usize },
    /// MERGED already held exactly these bytes.
    Unchanged,
}

/// Result of [`apply_all_and_write`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// MERGED had no conflicts; nothing was written.
    NoConflicts,
    /// MERGED already matched the resolved output.
    Unchanged,
    Written { conflicts: usize },
}

/// Produce the diff3 merge view for `inputs` with `backend`.
pub async fn produce_merge_view(
    inputs: &MergeInputs,
    backend: MergeBackend,
) -> Result<Vec<u8>, SessionError> {
    match backend {
        MergeBackend::Git => Ok(merge_file_diff3(&inputs.local, &inputs.base, &inputs.remote).await?),
        MergeBackend::Builtin => {
            let base = read(&inputs.base).await?;
            let local = read(&inputs.local).await?;
            let remote = read(&inputs.remote).await?;
            Ok(Merger::diff3_view(&base, &local, &remote).bytes)
        }
    }
}

/// True when the file at `path` parses and has no conflicts.
///
/// Malformed markers are an error, never "resolved".
pub async fn check_resolved_file(path: &Path) -> Result<bool, SessionError> {
    let data = read(path).await?;
    let doc = parse(&data)?;
    Ok(!doc.has_conflicts())
}

/// Resolve every conflict of MERGED with `resolution` and write it.
#[instrument(skip(inputs, options), fields(merged = %inputs.merged.display()))]
pub async fn apply_all_and_write(
    inputs: &MergeInputs,
    resolution: Resolution,
    options: &ResolverConfig,
) -> Result<ApplyOutcome, SessionError> {
    let merged_bytes = read(&inputs.merged).await?;
    if !parse(&merged_bytes)?.has_conflicts() {
        info!("no conflicts in merged file, nothing to apply");
        return Ok(ApplyOutcome::NoConflicts);
    }

    let view = produce_merge_view(inputs, options.merge_backend).await?;
    let doc = parse(&view)?;
    if !doc.has_conflicts() {
        return Err(SessionError::ViewHasNoConflicts(inputs.merged.display().to_string()));
    }
    if !options.allow_missing_base {
        validate_base_completeness(&doc)?;
    }

    let conflicts = doc.conflict_count();
    let mut state = ResolutionState::new(doc, options.max_undo)?;
    state.apply_all(resolution)?;
    let resolved = state.preview()?;
    if resolved == merged_bytes {
        return Ok(ApplyOutcome::Unchanged);
    }

    if options.backup {
        write_backup(&inputs.merged, &options.backup_suffix, &merged_bytes).await?;
    }
    write_file(&inputs.merged, &resolved).await?;
    verify_clean(&resolved)?;

    info!(conflicts, %resolution, "applied resolution to all conflicts");
    Ok(ApplyOutcome::Written { conflicts })
}

/// An open resolution session for one conflicted file.
pub struct Session {
    inputs: MergeInputs,
    options: ResolverConfig,
    state: ResolutionState,
    manual: ManualResolutions,
}

impl Session {
    /// Produce and parse the merge view, then pick up any resolutions
    /// already present in MERGED.
    ///
    /// A MERGED file that cannot be reconciled is logged and ignored.
    #[instrument(skip(inputs, options), fields(merged = %inputs.merged.display()))]
    pub async fn open(inputs: MergeInputs, options: ResolverConfig) -> Result<Self, SessionError> {
        let view = produce_merge_view(&inputs, options.merge_backend).await?;
        let doc = parse(&view)?;
        if !options.allow_missing_base {
            validate_base_completeness(&doc)?;
        }
        info!(conflicts = doc.conflict_count(), "opened merge view");

        let mut session = Self {
            state: ResolutionState::new(doc, options.max_undo)?,
            manual: ManualResolutions::new(),
            inputs,
            options,
        };

        match tokio::fs::read(&session.inputs.merged).await {
            Ok(edited) => {
                if let Err(e) = session.adopt_edited(&edited) {
                    warn!(error = %e, "ignoring resolutions in merged file");
                }
            }
            Err(e) => debug!(error = %e, "merged file not readable, starting fresh"),
        }
        Ok(session)
    }

    pub fn inputs(&self) -> &MergeInputs {
        &self.inputs
    }

    pub fn document(&self) -> &Document {
        self.state.document()
    }

    pub fn state(&self) -> &ResolutionState {
        &self.state
    }

    pub fn manual(&self) -> &ManualResolutions {
        &self.manual
    }

    pub fn status(&self, index: usize) -> Option<ConflictStatus> {
        let c = self.document().conflict(index)?;
        Some(if self.manual.contains_key(&index) {
            ConflictStatus::Manual
        } else if c.is_resolved() {
            ConflictStatus::Resolved(c.resolution())
        } else {
            ConflictStatus::Unresolved
        })
    }

    /// Conflicts with neither a resolution nor a manual entry.
    pub fn unresolved_count(&self) -> usize {
        (0..self.document().conflict_count())
            .filter(|&i| self.status(i) == Some(ConflictStatus::Unresolved))
            .count()
    }

    /// Resolve conflict `index`, discarding any manual edit for it.
    pub fn apply_resolution(&mut self, index: usize, resolution: Resolution) -> Result<(), SessionError> {
        self.state.apply_resolution(index, resolution)?;
        self.manual.remove(&index);
        Ok(())
    }

    /// Resolve every conflict, discarding all manual edits.
    pub fn apply_all(&mut self, resolution: Resolution) -> Result<(), SessionError> {
        self.state.apply_all(resolution)?;
        self.manual.clear();
        Ok(())
    }

    pub fn undo(&mut self) -> Result<(), SessionError> {
        Ok(self.state.undo()?)
    }

    pub fn redo(&mut self) -> Result<(), SessionError> {
        Ok(self.state.redo()?)
    }

    pub fn execute(&mut self, command: ScriptCommand) -> Result<(), SessionError> {
        debug!(%command, "executing");
        match command {
            ScriptCommand::Apply { index, resolution } => self.apply_resolution(index, resolution),
            ScriptCommand::ApplyAll(resolution) => self.apply_all(resolution),
            ScriptCommand::Undo => self.undo(),
            ScriptCommand::Redo => self.redo(),
        }
    }

    /// Strict, manual-aware render of the current state.
    pub fn preview(&self) -> Result<Vec<u8>, RenderError> {
        render(self.document(), &self.manual, RenderMode::Strict)
    }

    /// Strict render, or the permissive one when conflicts remain.
    pub fn render_output(&self) -> (Vec<u8>, bool) {
        match self.preview() {
            Ok(bytes) => (bytes, true),
            Err(RenderError::Unresolved { .. }) => (render_permissive(self.document(), &self.manual), false),
        }
    }

    /// Write the current state to MERGED.
    ///
    /// A fully resolved output is re-parsed to confirm no markers remain.
    #[instrument(skip(self), fields(merged = %self.inputs.merged.display()))]
    pub async fn write(&self) -> Result<WriteOutcome, SessionError> {
        let (bytes, resolved) = self.render_output();
        let previous = tokio::fs::read(&self.inputs.merged).await.ok();
        if previous.as_deref() == Some(bytes.as_slice()) {
            debug!("merged file unchanged");
            return Ok(WriteOutcome::Unchanged);
        }

        if self.options.backup {
            if let Some(previous) = &previous {
                write_backup(&self.inputs.merged, &self.options.backup_suffix, previous).await?;
            }
        }
        write_file(&self.inputs.merged, &bytes).await?;

        if resolved {
            verify_clean(&bytes)?;
            info!("wrote resolved file");
            Ok(WriteOutcome::Resolved)
        } else {
            let unresolved = self.unresolved_count();
            info!(unresolved, "wrote file with unresolved conflicts");
            Ok(WriteOutcome::Partial { unresolved })
        }
    }

    /// Re-derive resolutions from MERGED after an external edit.
    ///
    /// On success history is reset; on failure the session is unchanged.
    pub async fn reload_from_edited(&mut self) -> Result<(), SessionError> {
        let edited = read(&self.inputs.merged).await?;
        self.adopt_edited(&edited)
    }

    /// Write the current state, open MERGED in `editor`, then reload it.
    pub async fn edit_with(&mut self, editor: &str) -> Result<(), SessionError> {
        self.write().await?;

        let mut words = editor.split_whitespace();
        let program = words.next().ok_or_else(|| SessionError::EditorFailed {
            editor: editor.to_string(),
            detail: "empty editor command".into(),
        })?;
        info!(editor, "launching editor");
        let status = Command::new(program)
            .args(words)
            .arg(&self.inputs.merged)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| SessionError::EditorFailed {
                editor: editor.to_string(),
                detail: e.to_string(),
            })?;
        if !status.success() {
            return Err(SessionError::EditorFailed {
                editor: editor.to_string(),
                detail: format!("exited with {status}"),
            });
        }

        self.reload_from_edited().await
    }

    /// Whole-file line classification of LOCAL and REMOTE.
    pub async fn classify(&self) -> Result<FileClassification, SessionError> {
        let base = read(&self.inputs.base).await?;
        let local = read(&self.inputs.local).await?;
        let remote = read(&self.inputs.remote).await?;
        Ok(classify_files(self.document(), &base, &local, &remote)?)
    }

    fn adopt_edited(&mut self, edited: &[u8]) -> Result<(), SessionError> {
        let reconciled = reconcile(self.state.document(), edited)?;
        self.state = ResolutionState::new(reconciled.document, self.options.max_undo)?;
        self.manual = reconciled.manual;
        debug!(manual = self.manual.len(), "adopted resolutions from merged file");
        Ok(())
    }
}

/// `merged` with `suffix` appended to its file name.
pub fn backup_path(merged: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(merged.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

async fn read(path: &Path) -> Result<Vec<u8>, SessionError> {
    tokio::fs::read(path)
        .await
        .map_err(|e| SessionError::io("read", path, e))
}

async fn write_file(path: &Path, bytes: &[u8]) -> Result<(), SessionError> {
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| SessionError::io("write", path, e))
}

async fn write_backup(merged: &Path, suffix: &str, previous: &[u8]) -> Result<(), SessionError> {
    let path = backup_path(merged, suffix);
    write_file(&path, previous).await?;
    info!(path = %path.display(), "wrote backup");
    Ok(())
}

fn verify_clean(bytes: &[u8]) -> Result<(), SessionError> {
    if parse(bytes)?.has_conflicts() {
        return Err(SessionError::StillConflicted);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backup_path_appends_suffix() {
        assert_eq!(
            backup_path(Path::new("/repo/src/main.rs"), ".ec.bak"),
            PathBuf::from("/repo/src/main.rs.ec.bak")
        );
    }

    #[test]
    fn test_verify_clean() {
        assert!(verify_clean(b"clean\n").is_ok());
        assert!(matches!(
            verify_clean(b"<<<<<<<\na\n=======\nb\n>>>>>>>\n"),
            Err(SessionError::StillConflicted)
        ));
        assert!(matches!(
            verify_clean(b"<<<<<<< broken\n"),
            Err(SessionError::Marker(_))
        ));
    }

    #[test]
    fn test_conflict_status_serializes_tagged() {
        let json = serde_json::to_string(&ConflictStatus::Resolved(Resolution::Both)).unwrap();
        assert_eq!(json, r#"{"status":"resolved","resolution":"both"}"#);
        let json = serde_json::to_string(&ConflictStatus::Manual).unwrap();
        assert_eq!(json, r#"{"status":"manual"}"#);
    }
}
