//! Age-based temp branch cleanup
//!
//! Separate from the deletion done by a squash: a stale branch may never have
//! been merged. Every candidate records whether it is an ancestor of HEAD, and
//! deleting one that is not is logged and reported on its own.

use chrono::{DateTime, Duration, Utc};
use std::path::PathBuf;
use tracing::{info, warn};

use super::branch::{TempBranch, TempBranchManager};
use super::ops::{GitError, GitOps};

/// Days after which a temp branch is stale when nothing else is configured
pub const DEFAULT_MAX_AGE_DAYS: u32 = 7;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupCandidate {
    pub branch: TempBranch,
    pub age_days: i64,
    /// Reachable from HEAD, so deleting it loses no commits
    pub merged: bool,
    /// Checked out right now; never deleted
    pub is_current: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupPlan {
    pub directory: PathBuf,
    pub max_age_days: u32,
    pub candidates: Vec<CleanupCandidate>,
}

impl CleanupPlan {
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Candidates that would lose commits if deleted
    pub fn unmerged(&self) -> impl Iterator<Item = &CleanupCandidate> {
        self.candidates.iter().filter(|c| !c.merged && !c.is_current)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Deleted branches that were merged
    pub deleted: Vec<String>,
    /// Deleted branches whose commits are no longer reachable from HEAD
    pub deleted_unmerged: Vec<String>,
    /// Branches left alone, with the reason
    pub skipped: Vec<(String, String)>,
    /// Confirmation was declined; nothing was deleted
    pub cancelled: bool,
}

impl CleanupReport {
    pub fn deleted_count(&self) -> usize {
        self.deleted.len() + self.deleted_unmerged.len()
    }
}

/// Finds and deletes stale temp branches in one repository
pub struct CleanupPlanner {
    branches: TempBranchManager,
}

impl CleanupPlanner {
    pub fn new(git: GitOps, prefix: impl Into<String>) -> Self {
        Self {
            branches: TempBranchManager::new(git, prefix),
        }
    }

    fn git(&self) -> &GitOps {
        self.branches.git()
    }

    /// Temp branches whose last commit is older than `max_age_days`
    pub fn plan(&self, max_age_days: u32) -> Result<CleanupPlan, GitError> {
        self.plan_at(max_age_days, Utc::now())
    }

    pub fn plan_at(&self, max_age_days: u32, now: DateTime<Utc>) -> Result<CleanupPlan, GitError> {
        let max_age = Duration::days(i64::from(max_age_days));
        let current = self.git().current_branch()?;

        let mut candidates = Vec::new();
        for branch in self.branches.list()? {
            // branches without a readable commit time are never stale
            let Some(last_commit_at) = branch.last_commit_at else {
                continue;
            };
            let age = now.signed_duration_since(last_commit_at);
            if age <= max_age {
                continue;
            }

            let merged = self.is_merged(&branch.name)?;
            let is_current = branch.name == current;
            candidates.push(CleanupCandidate {
                age_days: age.num_days(),
                merged,
                is_current,
                branch,
            });
        }

        Ok(CleanupPlan {
            directory: self.git().dir().to_path_buf(),
            max_age_days,
            candidates,
        })
    }

    /// Whether every commit of `branch` is reachable from HEAD
    pub fn is_merged(&self, branch: &str) -> Result<bool, GitError> {
        if !self.git().has_head()? {
            return Ok(false);
        }
        self.git()
            .probe(&["merge-base", "--is-ancestor", branch, "HEAD"])
    }

    /// Delete the planned branches. Without `force`, `confirm` must accept
    /// the plan first. The checked-out branch is always skipped.
    pub fn execute<F>(&self, plan: &CleanupPlan, force: bool, confirm: F) -> Result<CleanupReport, GitError>
    where
        F: FnOnce(&CleanupPlan) -> bool,
    {
        let mut report = CleanupReport::default();
        if plan.is_empty() {
            return Ok(report);
        }
        if !force && !confirm(plan) {
            report.cancelled = true;
            return Ok(report);
        }

        for candidate in &plan.candidates {
            let name = &candidate.branch.name;
            if candidate.is_current {
                report
                    .skipped
                    .push((name.clone(), "currently checked out".to_string()));
                continue;
            }

            match self.git().run(&["branch", "-D", name]) {
                Ok(_) if candidate.merged => {
                    info!("Deleted temp branch {}", name);
                    report.deleted.push(name.clone());
                }
                Ok(_) => {
                    warn!(
                        "Deleted unmerged temp branch {} ({} commits no longer reachable from HEAD)",
                        name, candidate.branch.commit_count
                    );
                    report.deleted_unmerged.push(name.clone());
                }
                Err(e) => {
                    let reason = e.stderr().map(str::to_string).unwrap_or_else(|| e.to_string());
                    warn!("Could not delete temp branch {}: {}", name, reason);
                    report.skipped.push((name.clone(), reason));
                }
            }
        }

        Ok(report)
    }
}
