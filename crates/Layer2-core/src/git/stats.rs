//! Change statistics
//!
//! Measures how much a working tree differs from its last commit:
//! tracked additions and deletions against HEAD, plus the line counts of
//! untracked files that are not ignored. Repositories without any commit
//! count every staged line as added. Only paths below the collector's
//! directory are measured, so a subdirectory of a larger repository sees its
//! own changes and nothing else.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use super::ops::{GitError, GitOps};

/// How a file changed relative to HEAD
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    New,
    Modified,
    Deleted,
}

/// Per-file change record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    pub path: String,
    pub added: u64,
    pub deleted: u64,
    pub status: FileStatus,
}

impl FileChange {
    pub fn new(path: impl Into<String>, added: u64, deleted: u64, status: FileStatus) -> Self {
        Self {
            path: path.into(),
            added,
            deleted,
            status,
        }
    }

    pub fn total(&self) -> u64 {
        self.added + self.deleted
    }
}

/// Snapshot of a working tree's pending changes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeStats {
    /// Whether the repository has a commit to diff against
    pub has_head: bool,
    pub tracked_added: u64,
    pub tracked_deleted: u64,
    pub files_changed: u64,
    pub untracked_count: u64,
    pub untracked_lines: u64,
    pub file_stats: Vec<FileChange>,
}

impl ChangeStats {
    /// Magnitude compared against a directory's threshold.
    ///
    /// Before the first commit only staged lines count; untracked files are
    /// reported but not summed.
    pub fn total_changes(&self) -> u64 {
        if self.has_head {
            self.tracked_added + self.tracked_deleted + self.untracked_lines
        } else {
            self.tracked_added
        }
    }

    pub fn is_clean(&self) -> bool {
        self.files_changed == 0 && self.untracked_count == 0 && self.file_stats.is_empty()
    }
}

// ============================================================================
// Collector
// ============================================================================

/// Reads pending changes of one repository
pub struct ChangeStatsCollector {
    git: GitOps,
}

impl ChangeStatsCollector {
    pub fn new(git: GitOps) -> Self {
        Self { git }
    }

    /// Collect statistics for the bound directory
    pub fn collect(&self) -> Result<ChangeStats, GitError> {
        if !GitOps::is_repo(self.git.dir()) {
            return Err(GitError::NotARepository(self.git.dir().to_path_buf()));
        }

        let untracked = self.untracked_files()?;
        let mut stats = if self.git.has_head()? {
            self.collect_against_head()?
        } else {
            self.collect_unborn()?
        };

        stats.untracked_count = untracked.len() as u64;
        stats.untracked_lines = untracked.iter().map(|change| change.added).sum();
        stats.file_stats.extend(untracked);
        Ok(stats)
    }

    fn collect_against_head(&self) -> Result<ChangeStats, GitError> {
        let mut stats = ChangeStats {
            has_head: true,
            ..ChangeStats::default()
        };

        // `diff --quiet` exits 0 when there is nothing to report
        if self.git.probe(&["diff", "--quiet", "--relative", "HEAD", "--", "."])? {
            return Ok(stats);
        }

        let numstat = self.git.run(&[
            "diff", "--numstat", "--no-renames", "--relative", "HEAD", "--", ".",
        ])?;
        let name_status = self.git.run(&[
            "diff", "--name-status", "--no-renames", "--relative", "HEAD", "--", ".",
        ])?;
        let statuses = parse_name_status(&name_status);

        for (added, deleted, path) in parse_numstat(&numstat) {
            let code = statuses.get(path.as_str()).copied();
            // a changed binary file counts as one line
            let (added, deleted) = match (added, deleted, code) {
                (None, None, Some('D')) => (0, 1),
                (None, None, _) => (1, 0),
                (added, deleted, _) => (added.unwrap_or(0), deleted.unwrap_or(0)),
            };
            let status = classify(added, deleted, code);

            stats.tracked_added += added;
            stats.tracked_deleted += deleted;
            stats.files_changed += 1;
            stats.file_stats.push(FileChange::new(path, added, deleted, status));
        }

        Ok(stats)
    }

    fn collect_unborn(&self) -> Result<ChangeStats, GitError> {
        let mut stats = ChangeStats::default();

        let numstat = self.git.run(&[
            "diff", "--staged", "--numstat", "--no-renames", "--relative", "--", ".",
        ])?;
        for (added, _, path) in parse_numstat(&numstat) {
            // binary files still count as one line
            let added = added.unwrap_or(1);
            stats.tracked_added += added;
            stats.files_changed += 1;
            stats.file_stats.push(FileChange::new(path, added, 0, FileStatus::New));
        }

        Ok(stats)
    }

    /// Untracked, non-ignored files with their line counts
    fn untracked_files(&self) -> Result<Vec<FileChange>, GitError> {
        let listing = self
            .git
            .run(&["ls-files", "-z", "--others", "--exclude-standard"])?;

        Ok(listing
            .split('\0')
            .filter(|path| !path.is_empty())
            .map(|path| {
                let lines = count_lines(&self.git.dir().join(path));
                FileChange::new(path, lines, 0, FileStatus::New)
            })
            .collect())
    }
}

/// Collect statistics for a directory
pub fn collect(path: impl AsRef<Path>) -> Result<ChangeStats, GitError> {
    ChangeStatsCollector::new(GitOps::new(path.as_ref())).collect()
}

// ============================================================================
// Parsing
// ============================================================================

/// Parse `git diff --numstat` output into `(added, deleted, path)`.
/// Binary entries (`-`) yield `None` counts; malformed lines are skipped.
pub fn parse_numstat(output: &str) -> Vec<(Option<u64>, Option<u64>, String)> {
    output
        .lines()
        .filter_map(|line| {
            let mut parts = line.splitn(3, '\t');
            let added = parts.next()?;
            let deleted = parts.next()?;
            let path = parts.next()?;
            if path.is_empty() {
                return None;
            }
            Some((parse_count(added)?, parse_count(deleted)?, path.to_string()))
        })
        .collect()
}

/// `Some(None)` for the binary marker, `None` for garbage
fn parse_count(raw: &str) -> Option<Option<u64>> {
    if raw == "-" {
        Some(None)
    } else {
        raw.parse().ok().map(Some)
    }
}

/// Parse `git diff --name-status` output into path -> status letter
pub fn parse_name_status(output: &str) -> HashMap<&str, char> {
    output
        .lines()
        .filter_map(|line| {
            let (code, path) = line.split_once('\t')?;
            Some((path, code.chars().next()?))
        })
        .collect()
}

/// Status from the VCS letter, falling back to the line counts
pub fn classify(added: u64, deleted: u64, code: Option<char>) -> FileStatus {
    match code {
        Some('A') => FileStatus::New,
        Some('D') => FileStatus::Deleted,
        Some(_) => FileStatus::Modified,
        None if added == 0 && deleted > 0 => FileStatus::Deleted,
        None => FileStatus::Modified,
    }
}

/// Lines in a file on disk. Binary or unreadable files count as one line.
pub fn count_lines(path: &Path) -> u64 {
    match std::fs::read(path) {
        Ok(bytes) => count_text_lines(&bytes).unwrap_or(1),
        Err(_) => 1,
    }
}

/// Lines in text content, `None` if the content looks binary
pub fn count_text_lines(bytes: &[u8]) -> Option<u64> {
    if bytes.contains(&0) {
        return None;
    }
    let text = std::str::from_utf8(bytes).ok()?;
    Some(text.lines().count() as u64)
}

// ============================================================================
// Tests
// ============================================================================
