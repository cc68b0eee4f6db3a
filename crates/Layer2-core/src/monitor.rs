//! Monitoring cycle
//!
//! Evaluates every monitored directory in turn: skip it if it sits under an
//! exclusion, collect stats, compare with the threshold, commit (on a temp
//! branch when enabled) and report. One directory failing never stops the
//! others.

use chrono::{DateTime, Utc};
use doh_foundation::{default_name, GlobalSettings, SettingsStore};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::exclusion::find_excluded_parent;
use crate::git::{
    AutoCommitEngine, ChangeStats, ChangeStatsCollector, CommitOutcome, GitError, GitOps,
    TempBranch, TempBranchManager,
};
use crate::registry::resolve_path;
use crate::report::Reporter;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Store(#[from] doh_foundation::Error),
}

pub type Result<T> = std::result::Result<T, MonitorError>;

// ============================================================================
// Outcomes
// ============================================================================

/// A commit made by the monitor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitSummary {
    pub hash: String,
    pub total: u64,
    pub threshold: u64,
    /// Temp branch the commit landed on
    pub branch: Option<String>,
    /// Temp branches were enabled but unavailable, so the commit went to the
    /// current branch
    pub fell_back: bool,
}

/// What happened to one directory in a cycle
#[derive(Debug)]
pub enum DirectoryOutcome {
    Missing,
    /// The directory or one of its ancestors is excluded; nothing was read
    Excluded { excluded_by: PathBuf },
    NotAGitRepository,
    UnderThreshold { total: u64, threshold: u64 },
    Committed(CommitSummary),
    NothingToCommit { total: u64 },
    Failed(GitError),
}

impl DirectoryOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, DirectoryOutcome::Committed(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            DirectoryOutcome::Failed(_) | DirectoryOutcome::NotAGitRepository | DirectoryOutcome::Missing
        )
    }

    /// Whether the directory was looked at, i.e. its check time should move
    pub fn was_evaluated(&self) -> bool {
        !matches!(
            self,
            DirectoryOutcome::Missing | DirectoryOutcome::Excluded { .. }
        )
    }
}

#[derive(Debug)]
pub struct DirectoryReport {
    pub path: PathBuf,
    pub name: String,
    pub outcome: DirectoryOutcome,
}

/// Outcomes of one pass over the monitored directories
#[derive(Debug)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub directories: Vec<DirectoryReport>,
}

impl CycleReport {
    pub fn committed_count(&self) -> usize {
        self.directories.iter().filter(|d| d.outcome.is_committed()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.directories.iter().filter(|d| d.outcome.is_failure()).count()
    }
}

// ============================================================================
// Settings
// ============================================================================

/// Global settings as the monitor applies them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSettings {
    pub use_temp_branches: bool,
    pub temp_branch_prefix: String,
    /// Only set when the profile file exists
    pub git_profile: Option<PathBuf>,
}

impl From<&GlobalSettings> for MonitorSettings {
    fn from(settings: &GlobalSettings) -> Self {
        let git_profile = settings.git_profile_path().filter(|profile| {
            let exists = profile.is_file();
            if !exists {
                warn!("Git profile not found, ignoring: {}", profile.display());
            }
            exists
        });

        Self {
            use_temp_branches: settings.use_temp_branches,
            temp_branch_prefix: settings.temp_branch_prefix().to_string(),
            git_profile,
        }
    }
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self::from(&GlobalSettings::default())
    }
}

impl MonitorSettings {
    pub fn git(&self, path: &Path) -> GitOps {
        GitOps::new(path).with_profile(self.git_profile.clone())
    }

    pub fn branches(&self, git: GitOps) -> TempBranchManager {
        TempBranchManager::new(git, self.temp_branch_prefix.clone())
    }
}

// ============================================================================
// Evaluation
// ============================================================================

/// Evaluate one directory and commit if it reached its threshold
pub fn evaluate_directory(
    path: &Path,
    name: &str,
    threshold: u64,
    settings: &MonitorSettings,
) -> DirectoryOutcome {
    if !path.is_dir() {
        return DirectoryOutcome::Missing;
    }

    let git = settings.git(path);
    let stats = match ChangeStatsCollector::new(git.clone()).collect() {
        Ok(stats) => stats,
        Err(GitError::NotARepository(_)) => return DirectoryOutcome::NotAGitRepository,
        Err(e) => return DirectoryOutcome::Failed(e),
    };

    let total = stats.total_changes();
    if stats.is_clean() {
        return DirectoryOutcome::NothingToCommit { total };
    }
    if !AutoCommitEngine::decide(&stats, threshold) {
        return DirectoryOutcome::UnderThreshold { total, threshold };
    }

    let message = AutoCommitEngine::build_commit_message(name, &stats, threshold);
    match commit_with_strategy(&git, &message, settings) {
        Ok((CommitOutcome::Committed { hash }, branch)) => {
            DirectoryOutcome::Committed(CommitSummary {
                hash,
                total,
                threshold,
                fell_back: settings.use_temp_branches && branch.is_none(),
                branch,
            })
        }
        Ok((CommitOutcome::NothingToCommit, _)) => DirectoryOutcome::NothingToCommit { total },
        Err(e) => DirectoryOutcome::Failed(e),
    }
}

/// Commit on a temp branch when enabled. If the temp branch cannot be
/// created or checked out, the commit goes to the current branch.
fn commit_with_strategy(
    git: &GitOps,
    message: &str,
    settings: &MonitorSettings,
) -> std::result::Result<(CommitOutcome, Option<String>), GitError> {
    let mut branch = None;
    if settings.use_temp_branches {
        match settings.branches(git.clone()).ensure_on_temp_branch() {
            Ok(name) => branch = Some(name),
            Err(e) => warn!(
                "Temp branch unavailable in {}, committing on the current branch: {}",
                git.dir().display(),
                e
            ),
        }
    }

    let outcome = AutoCommitEngine::new(git.clone()).commit(message)?;
    Ok((outcome, branch))
}

// ============================================================================
// Monitor
// ============================================================================

/// Directory state relative to its threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryState {
    Clean,
    Changes(u64),
    OverThreshold(u64),
}

impl DirectoryState {
    pub fn classify(stats: &ChangeStats, threshold: u64) -> Self {
        if stats.is_clean() {
            DirectoryState::Clean
        } else if AutoCommitEngine::decide(stats, threshold) {
            DirectoryState::OverThreshold(stats.total_changes())
        } else {
            DirectoryState::Changes(stats.total_changes())
        }
    }
}

/// Snapshot of one directory for display
#[derive(Debug, Clone)]
pub struct DirectoryStatus {
    pub path: PathBuf,
    pub name: String,
    pub threshold: u64,
    pub monitored: bool,
    pub current_branch: String,
    pub stats: ChangeStats,
    pub state: DirectoryState,
    pub temp_branches: Vec<TempBranch>,
}

/// Runs monitoring against the directories in a settings store
pub struct Monitor<'a, S: SettingsStore> {
    store: &'a S,
}

impl<'a, S: SettingsStore> Monitor<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Evaluate every monitored directory once and record the check time
    pub fn run_cycle(&self, reporter: &mut dyn Reporter) -> Result<CycleReport> {
        let config = self.store.load()?;
        let settings = MonitorSettings::from(&config.global_settings);
        let mut report = CycleReport {
            started_at: Utc::now(),
            directories: Vec::with_capacity(config.directories.len()),
        };

        for (path, entry) in &config.directories {
            let name = entry.display_name(path);
            let outcome = match find_excluded_parent(path, &config.exclusions) {
                Some(excluded_by) => DirectoryOutcome::Excluded { excluded_by },
                None => evaluate_directory(path, &name, entry.threshold, &settings),
            };
            reporter.directory(path, &name, &outcome);
            report.directories.push(DirectoryReport {
                path: path.clone(),
                name,
                outcome,
            });
        }

        let evaluated: Vec<&Path> = report
            .directories
            .iter()
            .filter(|d| d.outcome.was_evaluated())
            .map(|d| d.path.as_path())
            .collect();
        if !evaluated.is_empty() {
            let checked_at = Utc::now();
            let touched = self.store.modify(|config| {
                for path in &evaluated {
                    config.touch_directory(path, checked_at);
                }
                Ok(())
            });
            if let Err(e) = touched {
                warn!("Could not record check time: {}", e);
            }
        }

        info!(
            "Monitoring cycle: {} directories, {} committed",
            report.directories.len(),
            report.committed_count()
        );
        reporter.cycle_finished(&report);
        Ok(report)
    }

    /// Evaluate one monitored directory now. `None` if it is not monitored.
    pub fn check(&self, path: &Path) -> Result<Option<DirectoryOutcome>> {
        let path = resolve_path(path);
        let config = self.store.load()?;
        let Some(entry) = config.directory(&path) else {
            return Ok(None);
        };

        let settings = MonitorSettings::from(&config.global_settings);
        let name = entry.display_name(&path);
        let outcome = match find_excluded_parent(&path, &config.exclusions) {
            Some(excluded_by) => DirectoryOutcome::Excluded { excluded_by },
            None => evaluate_directory(&path, &name, entry.threshold, &settings),
        };

        if outcome.was_evaluated() {
            self.store.modify(|config| {
                config.touch_directory(&path, Utc::now());
                Ok(())
            })?;
        }
        Ok(Some(outcome))
    }

    /// Commit everything in `path` now, regardless of threshold
    pub fn force_commit(&self, path: &Path) -> Result<CommitOutcome> {
        let path = resolve_path(path);
        let config = self.store.load()?;
        let settings = MonitorSettings::from(&config.global_settings);

        let git = settings.git(&path);
        let stats = ChangeStatsCollector::new(git.clone()).collect()?;
        let message = AutoCommitEngine::manual_commit_message(&stats);

        let (outcome, _) = commit_with_strategy(&git, &message, &settings)?;
        Ok(outcome)
    }

    /// Stats, threshold state and temp branches of `path`
    pub fn status(&self, path: &Path) -> Result<DirectoryStatus> {
        let path = resolve_path(path);
        let config = self.store.load()?;
        let settings = MonitorSettings::from(&config.global_settings);

        let entry = config.directory(&path);
        let threshold = entry
            .map(|e| e.threshold)
            .unwrap_or(config.global_settings.default_threshold);
        let name = entry
            .map(|e| e.display_name(&path))
            .unwrap_or_else(|| default_name(&path));

        let git = settings.git(&path);
        let stats = ChangeStatsCollector::new(git.clone()).collect()?;
        let current_branch = git.current_branch()?;
        let temp_branches = settings.branches(git).list()?;

        Ok(DirectoryStatus {
            state: DirectoryState::classify(&stats, threshold),
            monitored: entry.is_some(),
            path,
            name,
            threshold,
            current_branch,
            stats,
            temp_branches,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::{FileChange, FileStatus};
    use tempfile::TempDir;

    fn stats(added: u64) -> ChangeStats {
        ChangeStats {
            has_head: true,
            tracked_added: added,
            files_changed: 1,
            file_stats: vec![FileChange::new("a.txt", added, 0, FileStatus::Modified)],
            ..ChangeStats::default()
        }
    }

    #[test]
    fn test_classify_state() {
        assert_eq!(DirectoryState::classify(&ChangeStats::default(), 10), DirectoryState::Clean);
        assert_eq!(DirectoryState::classify(&stats(4), 10), DirectoryState::Changes(4));
        assert_eq!(DirectoryState::classify(&stats(10), 10), DirectoryState::OverThreshold(10));
    }

    #[test]
    fn test_missing_directory_outcome() {
        let outcome = evaluate_directory(
            Path::new("/nonexistent/doh/monitored"),
            "gone",
            10,
            &MonitorSettings::default(),
        );
        assert!(matches!(outcome, DirectoryOutcome::Missing));
    }

    #[test]
    fn test_plain_directory_outcome() {
        let temp = TempDir::new().unwrap();
        let outcome = evaluate_directory(temp.path(), "plain", 10, &MonitorSettings::default());
        assert!(matches!(outcome, DirectoryOutcome::NotAGitRepository));
    }

    #[test]
    fn test_missing_profile_dropped_from_settings() {
        let global = GlobalSettings {
            git_profile: Some("/nonexistent/profile.gitconfig".to_string()),
            ..GlobalSettings::default()
        };
        assert!(MonitorSettings::from(&global).git_profile.is_none());
    }
}
