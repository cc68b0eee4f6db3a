//! Reporting interface
//!
//! The monitor hands every per-directory outcome to a `Reporter` instead of
//! printing. The CLI renders to the console; embedders get `TracingReporter`.

use std::path::Path;
use tracing::{debug, info, warn};

use crate::monitor::{CycleReport, DirectoryOutcome};

/// Receives monitoring results as they are produced
pub trait Reporter {
    /// One directory was evaluated
    fn directory(&mut self, path: &Path, name: &str, outcome: &DirectoryOutcome);

    /// The whole cycle finished
    fn cycle_finished(&mut self, _report: &CycleReport) {}
}

/// Reports through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn directory(&mut self, path: &Path, name: &str, outcome: &DirectoryOutcome) {
        match outcome {
            DirectoryOutcome::Missing => {
                warn!("{}: directory no longer exists ({})", name, path.display())
            }
            DirectoryOutcome::Excluded { excluded_by } => info!(
                "{}: skipped, excluded by {}",
                name,
                excluded_by.display()
            ),
            DirectoryOutcome::NotAGitRepository => {
                warn!("{}: not a git repository ({})", name, path.display())
            }
            DirectoryOutcome::UnderThreshold { total, threshold } => {
                debug!("{}: {}/{} lines", name, total, threshold)
            }
            DirectoryOutcome::Committed(summary) => info!(
                "{}: committed {} ({} lines, threshold {})",
                name, summary.hash, summary.total, summary.threshold
            ),
            DirectoryOutcome::NothingToCommit { total } => {
                debug!("{}: nothing to commit ({} lines pending)", name, total)
            }
            DirectoryOutcome::Failed(err) => warn!("{}: {}", name, err),
        }
    }

    fn cycle_finished(&mut self, report: &CycleReport) {
        info!(
            "Checked {} directories, {} committed, {} failed",
            report.directories.len(),
            report.committed_count(),
            report.failed_count()
        );
    }
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn directory(&mut self, _path: &Path, _name: &str, _outcome: &DirectoryOutcome) {}
}
