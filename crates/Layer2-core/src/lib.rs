//! doh-core: Core engine for DOH
//!
//! Layer2 - everything between the settings store and the `doh` binary
//!
//! # Modules
//!
//! - `git`: change statistics, auto-commit, temp branches, squash, cleanup
//! - `exclusion`: excluded directories and their descendants
//! - `registry`: monitored directories and exclusions in a `SettingsStore`
//! - `monitor`: one monitoring cycle over every monitored directory
//! - `report`: `Reporter` interface for cycle outcomes
//!
//! # Example
//!
//! ```ignore
//! use doh_core::{Monitor, Registry, TracingReporter};
//! use doh_foundation::JsonSettingsStore;
//!
//! let store = JsonSettingsStore::global()?;
//! Registry::new(&store).add_directory(Path::new("."), Some(50), None)?;
//!
//! let report = Monitor::new(&store).run_cycle(&mut TracingReporter)?;
//! println!("{} committed", report.committed_count());
//! ```

pub mod exclusion;
pub mod git;
pub mod monitor;
pub mod registry;
pub mod report;

// Re-exports: Git
pub use git::{
    ensure_git_available, format_file_changes, AutoCommitEngine, ChangeStats,
    ChangeStatsCollector, CleanupCandidate, CleanupPlan, CleanupPlanner, CleanupReport,
    CommitOutcome, FileChange, FileStatus, GitError, GitOps, SquashCoordinator, SquashReport,
    SquashStep, TempBranch, TempBranchManager, DEFAULT_MAX_AGE_DAYS,
};

// Re-exports: Exclusion
pub use exclusion::{find_excluded_parent, is_excluded, ExclusionMatch, ExclusionResolver, ExclusionSet};

// Re-exports: Registry
pub use registry::{resolve_path, Registry, RegistryError};

// Re-exports: Monitor
pub use monitor::{
    evaluate_directory, CommitSummary, CycleReport, DirectoryOutcome, DirectoryReport,
    DirectoryState, DirectoryStatus, Monitor, MonitorError, MonitorSettings,
};

// Re-exports: Report
pub use report::{NullReporter, Reporter, TracingReporter};
