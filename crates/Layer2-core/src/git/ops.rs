//! Git Operations
//!
//! Every repository interaction is a blocking `git` subprocess run against one
//! directory. Non-zero exits outside the documented sentinels (`diff --quiet`,
//! `merge-base --is-ancestor`) surface as `GitError::CommandFailed`.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use thiserror::Error;
use tracing::{debug, warn};

use super::squash::SquashStep;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum GitError {
    #[error("Not a git repository: {}", .0.display())]
    NotARepository(PathBuf),

    #[error("git executable not found in PATH")]
    GitNotFound,

    #[error("git {command} failed in {} ({}): {stderr}", .dir.display(), exit_label(.code))]
    CommandFailed {
        dir: PathBuf,
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Branch not found: {0}")]
    BranchNotFound(String),

    #[error("Branch operation failed for '{branch}': {reason}")]
    BranchOperation { branch: String, reason: String },

    #[error("No temporary branch found in {}", .0.display())]
    NoTempBranch(PathBuf),

    #[error("Squash of '{temp_branch}' failed while {step}: {source}")]
    Squash {
        step: SquashStep,
        temp_branch: String,
        #[source]
        source: Box<GitError>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GitError {
    pub fn is_not_a_repository(&self) -> bool {
        matches!(self, GitError::NotARepository(_))
    }

    /// stderr of the failing git invocation, if any
    pub fn stderr(&self) -> Option<&str> {
        match self {
            GitError::CommandFailed { stderr, .. } => Some(stderr),
            GitError::Squash { source, .. } => source.stderr(),
            _ => None,
        }
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit {}", code),
        None => "killed by signal".to_string(),
    }
}

/// Locate the git executable
pub fn ensure_git_available() -> Result<PathBuf, GitError> {
    which::which("git").map_err(|_| GitError::GitNotFound)
}

// ============================================================================
// Git Operations
// ============================================================================

/// Git invocations bound to one directory
#[derive(Debug, Clone)]
pub struct GitOps {
    /// Directory every command runs in (`git -C <dir>`)
    dir: PathBuf,

    /// Config file included for every invocation
    profile: Option<PathBuf>,
}

impl GitOps {
    /// Bind to a directory without checking it
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            profile: None,
        }
    }

    /// Bind to a directory that must be a repository
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, GitError> {
        let dir = dir.into();
        if !Self::is_repo(&dir) {
            return Err(GitError::NotARepository(dir));
        }
        Ok(Self::new(dir))
    }

    /// Include a git config file (`-c include.path=...`) in every invocation.
    /// A profile that does not exist is ignored with a warning.
    pub fn with_profile(mut self, profile: Option<PathBuf>) -> Self {
        self.profile = match profile {
            Some(path) if path.is_file() => Some(path),
            Some(path) => {
                warn!("Git profile not found, ignoring: {}", path.display());
                None
            }
            None => None,
        };
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn profile(&self) -> Option<&Path> {
        self.profile.as_deref()
    }

    /// Check if a directory is inside a git repository
    pub fn is_repo(path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        if !path.is_dir() {
            return false;
        }
        Command::new("git")
            .arg("-C")
            .arg(path)
            .args(["rev-parse", "--git-dir"])
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    /// `git init` a directory
    pub fn init(dir: impl AsRef<Path>) -> Result<(), GitError> {
        Self::new(dir.as_ref()).run(&["init"])?;
        debug!("Initialized git repository in {}", dir.as_ref().display());
        Ok(())
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new("git");
        cmd.arg("-C").arg(&self.dir);
        cmd.args(["-c", "core.quotepath=off"]);
        if let Some(profile) = &self.profile {
            cmd.arg("-c")
                .arg(format!("include.path={}", profile.display()));
        }
        cmd.args(args);
        cmd
    }

    fn output(&self, args: &[&str]) -> Result<Output, GitError> {
        debug!("git {} (in {})", args.join(" "), self.dir.display());
        self.command(args).output().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                GitError::GitNotFound
            } else {
                GitError::Io(e)
            }
        })
    }

    fn failure(&self, args: &[&str], output: &Output) -> GitError {
        GitError::CommandFailed {
            dir: self.dir.clone(),
            command: args.join(" "),
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
    }

    /// Run a git command, returning stdout without trailing whitespace
    pub fn run(&self, args: &[&str]) -> Result<String, GitError> {
        let output = self.output(args)?;
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
        } else {
            Err(self.failure(args, &output))
        }
    }

    /// Run a sentinel command: exit 0 is `true`, exit 1 is `false`,
    /// anything else is an error
    pub fn probe(&self, args: &[&str]) -> Result<bool, GitError> {
        let output = self.output(args)?;
        match output.status.code() {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            _ => Err(self.failure(args, &output)),
        }
    }

    /// Whether the repository has at least one commit
    pub fn has_head(&self) -> Result<bool, GitError> {
        let output = self.output(&["rev-parse", "--verify", "--quiet", "HEAD"])?;
        Ok(output.status.success())
    }

    /// Whether a local branch exists
    pub fn branch_exists(&self, branch: &str) -> Result<bool, GitError> {
        let reference = format!("refs/heads/{}", branch);
        let output = self.output(&["rev-parse", "--verify", "--quiet", &reference])?;
        Ok(output.status.success())
    }

    /// Currently checked-out branch (empty when HEAD is detached)
    pub fn current_branch(&self) -> Result<String, GitError> {
        self.run(&["branch", "--show-current"])
    }

    /// Get short commit hash
    pub fn head_short(&self) -> Result<String, GitError> {
        self.run(&["rev-parse", "--short", "HEAD"])
    }

    pub fn checkout(&self, branch: &str) -> Result<(), GitError> {
        self.run(&["checkout", branch])?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_is_repo_missing_path() {
        assert!(!GitOps::is_repo("/nonexistent/path/that/does/not/exist"));
    }

    #[test]
    fn test_open_plain_directory() {
        let temp = TempDir::new().unwrap();
        let result = GitOps::open(temp.path());
        assert!(matches!(result, Err(ref e) if e.is_not_a_repository()));
    }

    #[test]
    fn test_missing_profile_is_ignored() {
        let git = GitOps::new("/tmp").with_profile(Some(PathBuf::from("/nonexistent/.gitconfig")));
        assert!(git.profile().is_none());
    }

    #[test]
    fn test_existing_profile_is_kept() {
        let temp = TempDir::new().unwrap();
        let profile = temp.path().join("work.gitconfig");
        std::fs::write(&profile, "[user]\n\tname = Work\n").unwrap();

        let git = GitOps::new(temp.path()).with_profile(Some(profile.clone()));
        assert_eq!(git.profile(), Some(profile.as_path()));
    }

    #[test]
    fn test_command_failed_display() {
        let err = GitError::CommandFailed {
            dir: PathBuf::from("/repo"),
            command: "commit -m x".to_string(),
            code: Some(128),
            stderr: "fatal: boom".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("commit -m x"));
        assert!(text.contains("exit 128"));
        assert!(text.contains("fatal: boom"));
        assert_eq!(err.stderr(), Some("fatal: boom"));
    }
}
