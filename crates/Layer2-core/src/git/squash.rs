//! Squashing a temp branch into its target
//!
//! checkout target -> `merge --squash` -> commit -> `branch -D`. Steps are not
//! rolled back: a failure after the checkout can leave squashed content staged
//! on the target, and the error names the step that failed.

use std::fmt;
use tracing::info;

use super::branch::TempBranchManager;
use super::ops::{GitError, GitOps};

const DEFAULT_TARGETS: [&str; 2] = ["main", "master"];

/// Stage of the squash sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SquashStep {
    Checkout,
    MergeSquash,
    Commit,
    DeleteBranch,
}

impl fmt::Display for SquashStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SquashStep::Checkout => "checking out the target branch",
            SquashStep::MergeSquash => "merging with --squash",
            SquashStep::Commit => "committing the squashed changes",
            SquashStep::DeleteBranch => "deleting the temp branch",
        };
        f.write_str(text)
    }
}

/// Result of a completed squash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SquashReport {
    pub temp_branch: String,
    pub target_branch: String,
    /// Short hash of the squash commit on the target
    pub commit: String,
}

/// Collapses a temp branch into one commit on a target branch
pub struct SquashCoordinator {
    branches: TempBranchManager,
}

impl SquashCoordinator {
    pub fn new(git: GitOps, prefix: impl Into<String>) -> Self {
        Self {
            branches: TempBranchManager::new(git, prefix),
        }
    }

    fn git(&self) -> &GitOps {
        self.branches.git()
    }

    /// Branch to squash: the explicit one, else the current temp branch,
    /// else the newest temp branch
    pub fn resolve_temp_branch(&self, explicit: Option<&str>) -> Result<String, GitError> {
        if let Some(branch) = explicit {
            if !self.git().branch_exists(branch)? {
                return Err(GitError::BranchNotFound(branch.to_string()));
            }
            return Ok(branch.to_string());
        }

        let current = self.git().current_branch()?;
        if self.branches.is_temp_branch(&current) {
            return Ok(current);
        }

        self.branches
            .latest()?
            .ok_or_else(|| GitError::NoTempBranch(self.git().dir().to_path_buf()))
    }

    /// `main` if it exists, else `master`
    pub fn default_target(&self) -> Result<String, GitError> {
        for candidate in DEFAULT_TARGETS {
            if self.git().branch_exists(candidate)? {
                return Ok(candidate.to_string());
            }
        }
        Err(GitError::BranchNotFound(DEFAULT_TARGETS.join(" or ")))
    }

    /// Squash the resolved temp branch into `target` with `message`.
    /// Nothing is touched when no temp branch can be resolved.
    pub fn squash(
        &self,
        target: &str,
        message: &str,
        temp_branch: Option<&str>,
    ) -> Result<SquashReport, GitError> {
        let temp_branch = self.resolve_temp_branch(temp_branch)?;

        if temp_branch == target {
            return Err(GitError::BranchOperation {
                branch: temp_branch,
                reason: "cannot squash a branch into itself".to_string(),
            });
        }
        if !self.git().branch_exists(target)? {
            return Err(GitError::BranchNotFound(target.to_string()));
        }

        let step = |step: SquashStep| {
            let temp_branch = temp_branch.clone();
            move |source: GitError| GitError::Squash {
                step,
                temp_branch,
                source: Box::new(source),
            }
        };

        self.git()
            .checkout(target)
            .map_err(step(SquashStep::Checkout))?;
        self.git()
            .run(&["merge", "--squash", &temp_branch])
            .map_err(step(SquashStep::MergeSquash))?;
        self.git()
            .run(&["commit", "-m", message])
            .map_err(step(SquashStep::Commit))?;
        let commit = self
            .git()
            .head_short()
            .map_err(step(SquashStep::Commit))?;
        self.git()
            .run(&["branch", "-D", &temp_branch])
            .map_err(step(SquashStep::DeleteBranch))?;

        info!(
            "Squashed {} into {} as {} in {}",
            temp_branch,
            target,
            commit,
            self.git().dir().display()
        );

        Ok(SquashReport {
            temp_branch,
            target_branch: target.to_string(),
            commit,
        })
    }
}
