//! Git Integration Module
//!
//! Everything DOH does to a repository:
//! - Change statistics against HEAD (tracked and untracked)
//! - Threshold decisions and auto-commit messages
//! - Temp branches that collect automatic commits
//! - Squashing a temp branch into its target
//! - Age-based cleanup of stale temp branches
//!
//! ## Features
//!
//! - **Stats**: `ChangeStatsCollector` turns `git diff` output into line totals
//! - **Auto-commit**: `AutoCommitEngine` stages everything and commits past a threshold
//! - **Temp branches**: `TempBranchManager` reuses or creates `<prefix>-<timestamp>`
//! - **Squash**: `SquashCoordinator` collapses a temp branch into one commit
//! - **Cleanup**: `CleanupPlanner` finds and deletes stale temp branches

pub mod branch;
pub mod cleanup;
pub mod commit;
pub mod ops;
pub mod squash;
pub mod stats;

pub use branch::{TempBranch, TempBranchManager};
pub use cleanup::{CleanupCandidate, CleanupPlan, CleanupPlanner, CleanupReport, DEFAULT_MAX_AGE_DAYS};
pub use commit::{format_file_changes, AutoCommitEngine, CommitOutcome};
pub use ops::{ensure_git_available, GitError, GitOps};
pub use squash::{SquashCoordinator, SquashReport, SquashStep};
pub use stats::{ChangeStats, ChangeStatsCollector, FileChange, FileStatus};
