use crate::error::{FeatureError, Result};
use std::path::PathBuf;
use std::process::Command;

// ---------------------------------------------------------------------------
// VersionControl
// ---------------------------------------------------------------------------

/// The version-control capabilities the orchestrator drives. Kept as a
/// trait so the state machine can be exercised against a scripted fake.
pub trait VersionControl {
    fn current_branch(&self) -> Result<String>;

    fn list_branches(&self) -> Result<Vec<String>>;

    fn has_uncommitted_changes(&self) -> Result<bool>;

    fn checkout(&self, branch: &str) -> Result<()>;

    /// Stage and commit all outstanding changes; returns the new commit id.
    fn commit_all(&self, message: &str) -> Result<String>;

    fn head_commit(&self) -> Result<String>;

    /// Move the current branch pointer to the parent of `commit_id`.
    ///
    /// Mixed reset: the commit's tree content stays in the working
    /// directory, so a stash commit reverted this way reappears as
    /// uncommitted changes.
    fn reset_to_parent_of(&self, commit_id: &str) -> Result<()>;
}

// ---------------------------------------------------------------------------
// GitRepository
// ---------------------------------------------------------------------------

/// `VersionControl` over the `git` binary.
pub struct GitRepository {
    workdir: PathBuf,
}

impl GitRepository {
    pub fn open(workdir: impl Into<PathBuf>) -> Result<Self> {
        which::which("git").map_err(|_| FeatureError::GitUnavailable)?;
        Ok(Self {
            workdir: workdir.into(),
        })
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        tracing::debug!(?args, "running git");
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .map_err(|e| FeatureError::Git(format!("failed to spawn git: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FeatureError::Git(format!(
                "git {} exited with {}: {}",
                args.first().copied().unwrap_or(""),
                output.status,
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl VersionControl for GitRepository {
    fn current_branch(&self) -> Result<String> {
        let out = self.run(&["rev-parse", "--abbrev-ref", "HEAD"])?;
        Ok(out.trim().to_string())
    }

    fn list_branches(&self) -> Result<Vec<String>> {
        let out = self.run(&["for-each-ref", "--format=%(refname:short)", "refs/heads"])?;
        Ok(out
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn has_uncommitted_changes(&self) -> Result<bool> {
        let out = self.run(&["status", "--porcelain"])?;
        Ok(!out.trim().is_empty())
    }

    fn checkout(&self, branch: &str) -> Result<()> {
        self.run(&["checkout", branch])
            .map_err(|e| FeatureError::CheckoutFailed {
                branch: branch.to_string(),
                detail: e.to_string(),
            })?;
        Ok(())
    }

    fn commit_all(&self, message: &str) -> Result<String> {
        self.run(&["add", "-A"])?;
        self.run(&["commit", "--no-verify", "-m", message])?;
        self.head_commit()
    }

    fn head_commit(&self) -> Result<String> {
        let out = self.run(&["rev-parse", "HEAD"])?;
        Ok(out.trim().to_string())
    }

    fn reset_to_parent_of(&self, commit_id: &str) -> Result<()> {
        self.run(&["reset", &format!("{commit_id}~")])?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
