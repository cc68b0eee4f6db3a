//! Auto-commit decisions and commit messages
//!
//! A directory is committed once its pending change total reaches the
//! configured threshold. Messages carry a short title listing the largest
//! changes and a body with the numbers that triggered the commit.

use chrono::{DateTime, Local};
use std::fmt::Write as _;
use tracing::info;

use super::ops::{GitError, GitOps};
use super::stats::{ChangeStats, FileChange, FileStatus};

/// Files named in an automatic commit title
pub const TITLE_FILE_LIMIT: usize = 3;

/// Files listed in a commit body
pub const BODY_FILE_LIMIT: usize = 10;

/// Files named in a manual commit title
pub const MANUAL_TITLE_FILE_LIMIT: usize = 5;

/// Result of a commit attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// A commit was created; carries its short hash
    Committed { hash: String },
    /// Nothing below the directory was staged after `git add -A -- .`
    NothingToCommit,
}

impl CommitOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, CommitOutcome::Committed { .. })
    }
}

/// Decides, formats and executes automatic commits
pub struct AutoCommitEngine {
    git: GitOps,
}

impl AutoCommitEngine {
    pub fn new(git: GitOps) -> Self {
        Self { git }
    }

    /// Whether pending changes reach the threshold (inclusive)
    pub fn decide(stats: &ChangeStats, threshold: u64) -> bool {
        stats.total_changes() >= threshold
    }

    /// Full commit message for an automatic commit made now
    pub fn build_commit_message(name: &str, stats: &ChangeStats, threshold: u64) -> String {
        Self::build_commit_message_at(name, stats, threshold, Local::now())
    }

    /// Full commit message for an automatic commit at `timestamp`
    pub fn build_commit_message_at(
        name: &str,
        stats: &ChangeStats,
        threshold: u64,
        timestamp: DateTime<Local>,
    ) -> String {
        let mut message = format!(
            "Auto-commit: {}\n\n",
            format_file_changes(&stats.file_stats, TITLE_FILE_LIMIT)
        );

        let _ = writeln!(message, "Project: {}", name);
        let _ = writeln!(message, "Timestamp: {}", timestamp.format("%Y-%m-%d %H:%M:%S"));
        let _ = writeln!(
            message,
            "Threshold: {} lines (reached with {} changes)",
            threshold,
            stats.total_changes()
        );
        message.push('\n');

        message.push_str("File Changes:\n");
        let _ = writeln!(message, "{}", format_file_changes(&stats.file_stats, BODY_FILE_LIMIT));
        message.push('\n');

        message.push_str("Summary:\n");
        let _ = writeln!(message, "- Lines added: {}", stats.tracked_added);
        let _ = writeln!(message, "- Lines deleted: {}", stats.tracked_deleted);
        let _ = writeln!(message, "- Files changed: {}", stats.files_changed);
        let _ = writeln!(
            message,
            "- Untracked files: {} ({} lines)",
            stats.untracked_count, stats.untracked_lines
        );
        message.push('\n');
        message.push_str("Auto-committed by DOH monitoring system.");

        message
    }

    /// Message for a commit requested by the user regardless of threshold
    pub fn manual_commit_message(stats: &ChangeStats) -> String {
        format!(
            "Manual commit: {}",
            format_file_changes(&stats.file_stats, MANUAL_TITLE_FILE_LIMIT)
        )
    }

    /// Stage everything below the directory and commit it. Nothing staged
    /// there is `NothingToCommit`. Paths outside the directory are never
    /// staged or committed, even when the repository root is further up.
    pub fn commit(&self, message: &str) -> Result<CommitOutcome, GitError> {
        self.git.run(&["add", "-A", "--", "."])?;

        if !self.has_staged_changes()? {
            info!("Nothing to commit in {}", self.git.dir().display());
            return Ok(CommitOutcome::NothingToCommit);
        }

        self.git.run(&["commit", "-m", message, "--", "."])?;
        let hash = self.git.head_short()?;
        info!("Committed {} in {}", hash, self.git.dir().display());

        Ok(CommitOutcome::Committed { hash })
    }

    /// Whether the index differs from HEAD below the directory
    pub fn has_staged_changes(&self) -> Result<bool, GitError> {
        Ok(!self.git.probe(&["diff", "--staged", "--quiet", "--", "."])?)
    }
}

/// Largest changes first as `path (+A/-D)` entries, joined by commas.
/// Truncated lists end with `, +N more files`.
pub fn format_file_changes(file_stats: &[FileChange], max_files: usize) -> String {
    if file_stats.is_empty() {
        return "No file changes detected".to_string();
    }

    let mut sorted: Vec<&FileChange> = file_stats.iter().collect();
    // stable: ties keep the order git reported them in
    sorted.sort_by(|a, b| b.total().cmp(&a.total()));

    let mut parts: Vec<String> = sorted
        .iter()
        .take(max_files)
        .map(|change| format_file_change(change))
        .collect();

    if sorted.len() > max_files {
        parts.push(format!("+{} more files", sorted.len() - max_files));
    }

    parts.join(", ")
}

fn format_file_change(change: &FileChange) -> String {
    let detail = match change.status {
        FileStatus::New => format!("+{}", change.added),
        FileStatus::Deleted => format!("-{}", change.deleted),
        FileStatus::Modified => match (change.added, change.deleted) {
            (0, 0) => "modified".to_string(),
            (added, 0) => format!("~{}", added),
            (0, deleted) => format!("-{}", deleted),
            (added, deleted) => format!("+{}/-{}", added, deleted),
        },
    };
    format!("{} ({})", change.path, detail)
}

// ============================================================================
// Tests
// ============================================================================
