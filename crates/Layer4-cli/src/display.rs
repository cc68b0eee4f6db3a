//! Console rendering

use chrono::{DateTime, Local, Utc};
use doh_core::{
    CleanupPlan, CleanupReport, CommitOutcome, DirectoryOutcome, DirectoryState, DirectoryStatus,
    Reporter, TempBranch,
};
use doh_foundation::{DirectoryEntry, ExclusionEntry};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

/// Prints monitoring outcomes to stdout
pub struct ConsoleReporter {
    verbose: bool,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Reporter for ConsoleReporter {
    fn directory(&mut self, path: &Path, name: &str, outcome: &DirectoryOutcome) {
        match outcome {
            DirectoryOutcome::Committed(summary) => {
                let location = match (&summary.branch, summary.fell_back) {
                    (Some(branch), _) => format!(" on {}", branch),
                    (None, true) => " on the current branch (temp branch unavailable)".to_string(),
                    (None, false) => String::new(),
                };
                println!(
                    "✓ {}: committed {} ({} lines, threshold {}){}",
                    name, summary.hash, summary.total, summary.threshold, location
                );
            }
            DirectoryOutcome::Failed(err) => println!("✗ {}: {}", name, err),
            DirectoryOutcome::Missing => {
                println!("✗ {}: directory not found ({})", name, path.display())
            }
            DirectoryOutcome::Excluded { excluded_by } => {
                println!("⚠ {}: skipped, excluded by {}", name, excluded_by.display())
            }
            DirectoryOutcome::NotAGitRepository => {
                println!("✗ {}: not a git repository ({})", name, path.display())
            }
            DirectoryOutcome::UnderThreshold { total, threshold } if self.verbose => {
                println!("· {}: {}/{} lines", name, total, threshold)
            }
            DirectoryOutcome::NothingToCommit { .. } if self.verbose => {
                println!("· {}: clean", name)
            }
            _ => {}
        }
    }

    fn cycle_finished(&mut self, report: &doh_core::CycleReport) {
        if self.verbose || report.committed_count() > 0 || report.failed_count() > 0 {
            println!(
                "\nChecked {} directories: {} committed, {} with problems",
                report.directories.len(),
                report.committed_count(),
                report.failed_count()
            );
        }
    }
}

pub fn print_commit_outcome(outcome: &CommitOutcome) {
    match outcome {
        CommitOutcome::Committed { hash } => println!("✓ Changes committed ({})", hash),
        CommitOutcome::NothingToCommit => println!("Nothing to commit"),
    }
}

pub fn print_status(status: &DirectoryStatus) {
    println!("\n📁 {}", status.name);
    println!("  Path:      {}", status.path.display());
    if status.monitored {
        println!("  Threshold: {} lines", status.threshold);
    } else {
        println!("  Threshold: {} lines (not monitored)", status.threshold);
    }
    if !status.current_branch.is_empty() {
        println!("  Branch:    {}", status.current_branch);
    }
    println!("  State:     {}", describe_state(status.state, status.threshold));

    let stats = &status.stats;
    if !stats.is_clean() {
        println!(
            "  Changes:   +{} -{} in {} files, {} untracked ({} lines)",
            stats.tracked_added,
            stats.tracked_deleted,
            stats.files_changed,
            stats.untracked_count,
            stats.untracked_lines
        );
        println!(
            "  Files:     {}",
            doh_core::format_file_changes(&stats.file_stats, 5)
        );
    }

    if !status.temp_branches.is_empty() {
        println!("\n  Temp branches ({}):", status.temp_branches.len());
        print_temp_branches(&status.temp_branches, &status.current_branch);
    }
    println!();
}

pub fn print_status_line(status: &DirectoryStatus) {
    println!(
        "{:<24} {:<28} {}",
        truncate(&status.name, 22),
        describe_state(status.state, status.threshold),
        status.path.display()
    );
}

pub fn print_status_error(path: &Path, name: &str, err: &dyn std::fmt::Display) {
    println!("{:<24} {:<28} {}", truncate(name, 22), format!("✗ {}", err), path.display());
}

fn describe_state(state: DirectoryState, threshold: u64) -> String {
    match state {
        DirectoryState::Clean => "✓ clean".to_string(),
        DirectoryState::Changes(total) => format!("{}/{} lines", total, threshold),
        DirectoryState::OverThreshold(total) => {
            format!("⚠ {}/{} lines (will commit)", total, threshold)
        }
    }
}

fn print_temp_branches(branches: &[TempBranch], current: &str) {
    for branch in branches {
        let marker = if branch.name == current { "*" } else { " " };
        println!(
            "  {} {:<40} {:>4} commits  {:<16} {}",
            marker,
            branch.name,
            branch.commit_count,
            branch.last_commit_relative,
            branch
                .last_commit_at
                .map(format_time)
                .unwrap_or_default()
        );
    }
}

pub fn print_directories(directories: &[(PathBuf, DirectoryEntry)]) {
    if directories.is_empty() {
        println!("No directories are being monitored.");
        println!("Use 'doh add [DIR]' to start monitoring a directory.");
        return;
    }

    println!("\n📋 Monitored Directories\n");
    println!(
        "{:<24} {:<10} {:<18} {}",
        "Name", "Threshold", "Last checked", "Path"
    );
    println!("{}", "-".repeat(80));
    for (path, entry) in directories {
        println!(
            "{:<24} {:<10} {:<18} {}",
            truncate(&entry.display_name(path), 22),
            entry.threshold,
            format_time(entry.last_checked_at),
            path.display()
        );
    }
    println!();
}

pub fn print_exclusions(exclusions: &[(PathBuf, ExclusionEntry)]) {
    if exclusions.is_empty() {
        println!("No excluded directories.");
        return;
    }

    println!("\n🚫 Excluded Directories\n");
    for (path, entry) in exclusions {
        println!("  {}  (since {})", path.display(), format_time(entry.excluded_at));
    }
    println!();
}

pub fn print_cleanup_plan(plan: &CleanupPlan) {
    println!(
        "\nTemp branches older than {} days in {}:\n",
        plan.max_age_days,
        plan.directory.display()
    );
    for candidate in &plan.candidates {
        let note = if candidate.is_current {
            "checked out, will be kept"
        } else if candidate.merged {
            "merged"
        } else {
            "NOT merged, commits will be lost"
        };
        println!(
            "  {:<40} {:>4} days  {:>4} commits  {}",
            candidate.branch.name, candidate.age_days, candidate.branch.commit_count, note
        );
    }
    println!();
}

pub fn print_cleanup_report(report: &CleanupReport) {
    if report.cancelled {
        println!("Cleanup cancelled.");
        return;
    }
    for name in &report.deleted {
        println!("✓ Deleted {}", name);
    }
    for name in &report.deleted_unmerged {
        println!("⚠ Deleted unmerged {}", name);
    }
    for (name, reason) in &report.skipped {
        println!("· Kept {} ({})", name, reason);
    }
    println!("\n{} branches deleted.", report.deleted_count());
}

/// Ask a yes/no question on stdin; anything but yes is no
pub fn confirm(question: &str) -> bool {
    print!("{} [y/N] ", question);
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    is_yes(&answer)
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn format_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

/// Truncate a string for display
fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 22), "short");
        assert_eq!(truncate("a-very-long-project-name-here", 10), "a-very-...");
        assert_eq!(truncate("ünïcödé-ñame", 6), "ünï...");
    }

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes("\n"));
        assert!(!is_yes("nope"));
    }

    #[test]
    fn test_describe_state() {
        assert_eq!(describe_state(DirectoryState::Clean, 30), "✓ clean");
        assert_eq!(describe_state(DirectoryState::Changes(12), 30), "12/30 lines");
        assert!(describe_state(DirectoryState::OverThreshold(31), 30).starts_with("⚠ 31/30"));
    }
}
