//! Conflicted-index access via `git2`.

use std::path::{Path, PathBuf};

use git2::Repository;
use tempfile::TempDir;
use tracing::{debug, info, instrument, warn};

use crate::errors::GitError;

/// Index stage numbers of an unmerged entry.
pub const STAGE_BASE: u8 = 1;
pub const STAGE_OURS: u8 = 2;
pub const STAGE_THEIRS: u8 = 3;

/// A repository opened for conflict inspection.
pub struct ConflictRepo {
    repo: Repository,
    workdir: PathBuf,
}

/// Index stages of one conflicted path written to scratch files.
///
/// The scratch files are removed when this value is dropped.
pub struct StageFiles {
    _dir: TempDir,
    pub base: PathBuf,
    pub local: PathBuf,
    pub remote: PathBuf,
    /// Working-tree file holding the conflict markers.
    pub merged: PathBuf,
    /// The index had no base stage; an empty base file was written.
    pub missing_base: bool,
}

impl ConflictRepo {
    /// Find the repository containing `cwd`.
    pub fn discover<P: AsRef<Path>>(cwd: P) -> Result<Self, GitError> {
        let cwd = cwd.as_ref();
        let repo = Repository::discover(cwd)
            .map_err(|_| GitError::RepositoryNotFound(cwd.display().to_string()))?;
        let workdir = repo
            .workdir()
            .ok_or_else(|| GitError::RepositoryNotFound(cwd.display().to_string()))?
            .to_path_buf();
        info!(workdir = %workdir.display(), "opened git repository");
        Ok(Self { repo, workdir })
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Repository-relative paths with unmerged index entries, sorted.
    ///
    /// With a `scope`, only paths under that directory are returned.
    #[instrument(skip(self))]
    pub fn conflicted_paths(&self, scope: Option<&Path>) -> Result<Vec<String>, GitError> {
        let index = self.repo.index()?;
        let prefix = scope
            .and_then(|s| s.strip_prefix(&self.workdir).ok())
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .filter(|p| !p.is_empty());

        let mut paths = Vec::new();
        for conflict in index.conflicts()? {
            let conflict = conflict?;
            let entry = conflict.our.or(conflict.their).or(conflict.ancestor);
            let Some(entry) = entry else { continue };
            let path = String::from_utf8_lossy(&entry.path).into_owned();
            if let Some(prefix) = &prefix {
                if !path.starts_with(&format!("{prefix}/")) {
                    continue;
                }
            }
            paths.push(path);
        }
        paths.sort();
        paths.dedup();
        debug!(count = paths.len(), "listed conflicted paths");
        Ok(paths)
    }

    /// Blob contents of `path` at index `stage` (1 base, 2 ours, 3 theirs).
    pub fn read_stage(&self, path: &str, stage: u8) -> Result<Vec<u8>, GitError> {
        let index = self.repo.index()?;
        let entry = index
            .get_path(Path::new(path), i32::from(stage))
            .ok_or_else(|| GitError::StageMissing {
                path: path.to_string(),
                stage,
            })?;
        let blob = self.repo.find_blob(entry.id)?;
        Ok(blob.content().to_vec())
    }

    /// Write the base/ours/theirs stages of `path` to a scratch directory.
    ///
    /// A missing base stage (both sides added the file) is written as an
    /// empty file and flagged in [`StageFiles::missing_base`].
    #[instrument(skip(self))]
    pub fn materialize_stages(&self, path: &str) -> Result<StageFiles, GitError> {
        let local = self.read_stage(path, STAGE_OURS)?;
        let remote = self.read_stage(path, STAGE_THEIRS)?;
        let (base, missing_base) = match self.read_stage(path, STAGE_BASE) {
            Ok(bytes) => (bytes, false),
            Err(GitError::StageMissing { .. }) => {
                warn!(path, "base stage missing, continuing without base");
                (Vec::new(), true)
            }
            Err(e) => return Err(e),
        };

        let dir = tempfile::Builder::new().prefix("ec-stages-").tempdir()?;
        let name = Path::new(path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".into());
        let write = |tag: &str, bytes: &[u8]| -> Result<PathBuf, GitError> {
            let p = dir.path().join(format!("{name}.{tag}"));
            std::fs::write(&p, bytes)?;
            Ok(p)
        };

        let files = StageFiles {
            base: write("BASE", &base)?,
            local: write("LOCAL", &local)?,
            remote: write("REMOTE", &remote)?,
            merged: self.workdir.join(path),
            missing_base,
            _dir: dir,
        };
        debug!(dir = %files.base.display(), "materialized index stages");
        Ok(files)
    }
}
