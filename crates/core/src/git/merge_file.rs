//! `git merge-file` as a diff3 merge view producer.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, instrument, warn};

use crate::errors::GitError;

/// Run `git merge-file --diff3 -p LOCAL BASE REMOTE` and return its stdout.
///
/// Exit status 0 is a clean merge and 1..=127 is the number of conflicts;
/// both return the merged view. Any other status is a failure.
#[instrument(skip_all, fields(local = %local.display(), base = %base.display(), remote = %remote.display()))]
pub async fn merge_file_diff3(local: &Path, base: &Path, remote: &Path) -> Result<Vec<u8>, GitError> {
    let mut cmd = Command::new("git");
    cmd.arg("merge-file")
        .arg("--diff3")
        .arg("-p")
        .arg(local)
        .arg(base)
        .arg(remote)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let output = cmd.output().await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            GitError::BinaryNotFound("git".into())
        } else {
            GitError::IoError(e)
        }
    })?;

    match output.status.code() {
        Some(0) => {
            debug!("git merge-file: clean merge");
            Ok(output.stdout)
        }
        Some(conflicts @ 1..=127) => {
            debug!(conflicts, "git merge-file: conflicts");
            Ok(output.stdout)
        }
        code => {
            let exit_code = code.unwrap_or(-1);
            let mut stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            if stderr.is_empty() {
                stderr = format!("exit status {}", output.status);
            }
            warn!(exit_code, %stderr, "git merge-file failed");
            Err(GitError::MergeFileFailed { exit_code, stderr })
        }
    }
}

/// Whether a `git` binary can be spawned.
pub async fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|s| s.success())
        .unwrap_or(false)
}
