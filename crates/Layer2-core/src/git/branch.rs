//! Temporary branches
//!
//! Automatic commits accumulate on `<prefix>-<timestamp>` branches so they can
//! later be squashed into a single commit. A directory reuses the current temp
//! branch, then the newest existing one, and only creates a branch when none
//! exists.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::ops::{GitError, GitOps};

/// Timestamp suffix of new branch names; sorts chronologically
const BRANCH_TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S-%3f";

/// A temporary branch with its latest commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TempBranch {
    pub name: String,
    pub commit_count: u64,
    /// e.g. "3 days ago"; "unknown" when the log could not be read
    pub last_commit_relative: String,
    pub last_commit_at: Option<DateTime<Utc>>,
}

/// Finds, creates and switches to temporary branches in one repository
#[derive(Debug, Clone)]
pub struct TempBranchManager {
    git: GitOps,
    prefix: String,
}

impl TempBranchManager {
    pub fn new(git: GitOps, prefix: impl Into<String>) -> Self {
        Self {
            git,
            prefix: prefix.into(),
        }
    }

    pub fn git(&self) -> &GitOps {
        &self.git
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Whether `name` is `<prefix>-...`
    pub fn is_temp_branch(&self, name: &str) -> bool {
        name.strip_prefix(self.prefix.as_str())
            .map_or(false, |rest| rest.starts_with('-'))
    }

    /// Name for a branch created at `now`
    pub fn branch_name_at(&self, now: DateTime<Utc>) -> String {
        format!("{}-{}", self.prefix, now.format(BRANCH_TIMESTAMP_FORMAT))
    }

    /// Local temp branch names, oldest first
    pub fn list_names(&self) -> Result<Vec<String>, GitError> {
        let pattern = format!("{}-*", self.prefix);
        let output = self.git.run(&[
            "branch",
            "--list",
            &pattern,
            "--format=%(refname:short)",
        ])?;

        let mut names: Vec<String> = output
            .lines()
            .map(str::trim)
            .filter(|name| self.is_temp_branch(name))
            .map(str::to_string)
            .collect();
        names.sort();
        Ok(names)
    }

    /// Newest temp branch by name
    pub fn latest(&self) -> Result<Option<String>, GitError> {
        Ok(self.list_names()?.pop())
    }

    /// Temp branches with commit count and last commit time
    pub fn list(&self) -> Result<Vec<TempBranch>, GitError> {
        Ok(self
            .list_names()?
            .into_iter()
            .map(|name| self.describe(name))
            .collect())
    }

    /// Details for one branch; unreadable details degrade to defaults
    pub fn describe(&self, name: String) -> TempBranch {
        let commit_count = self
            .git
            .run(&["rev-list", "--count", &name])
            .ok()
            .and_then(|count| count.trim().parse().ok())
            .unwrap_or(0);

        let (last_commit_at, last_commit_relative) = self
            .git
            .run(&["log", "-1", "--format=%ct|%cr", &name])
            .ok()
            .and_then(|line| parse_last_commit(&line))
            .map(|(at, relative)| (Some(at), relative))
            .unwrap_or_else(|| (None, "unknown".to_string()));

        TempBranch {
            name,
            commit_count,
            last_commit_relative,
            last_commit_at,
        }
    }

    /// Current temp branch, else the newest one, else a new branch.
    /// A newly created branch is checked out immediately.
    pub fn get_or_create_temp_branch(&self) -> Result<String, GitError> {
        let current = self.git.current_branch()?;
        if self.is_temp_branch(&current) {
            debug!("Reusing current temp branch {}", current);
            return Ok(current);
        }

        if let Some(latest) = self.latest()? {
            debug!("Reusing existing temp branch {}", latest);
            return Ok(latest);
        }

        let name = self.branch_name_at(Utc::now());
        self.git
            .run(&["checkout", "-b", &name])
            .map_err(|e| branch_failure(&name, e))?;
        info!("Created temp branch {} in {}", name, self.git.dir().display());
        Ok(name)
    }

    /// Check out `branch`; a no-op when it is already current
    pub fn switch_to(&self, branch: &str) -> Result<(), GitError> {
        let current = self.git.current_branch()?;
        if current == branch {
            return Ok(());
        }
        self.git.checkout(branch).map_err(|e| branch_failure(branch, e))?;
        debug!("Switched to {} in {}", branch, self.git.dir().display());
        Ok(())
    }

    /// Resolve a temp branch and make it current. Every failure is reported
    /// as `BranchOperation` so callers can fall back to the current branch.
    pub fn ensure_on_temp_branch(&self) -> Result<String, GitError> {
        let branch = self
            .get_or_create_temp_branch()
            .map_err(|e| branch_failure(&self.prefix, e))?;
        self.switch_to(&branch)
            .map_err(|e| branch_failure(&branch, e))?;
        Ok(branch)
    }
}

fn branch_failure(branch: &str, err: GitError) -> GitError {
    match err {
        GitError::BranchOperation { .. } => err,
        other => GitError::BranchOperation {
            branch: branch.to_string(),
            reason: other.stderr().map(str::to_string).unwrap_or_else(|| other.to_string()),
        },
    }
}

/// Parse `%ct|%cr` log output
fn parse_last_commit(line: &str) -> Option<(DateTime<Utc>, String)> {
    let (timestamp, relative) = line.trim().split_once('|')?;
    let at = Utc.timestamp_opt(timestamp.parse().ok()?, 0).single()?;
    Some((at, relative.to_string()))
}

// ============================================================================
// Tests
// ============================================================================
