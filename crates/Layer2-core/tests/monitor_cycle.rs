//! Monitoring cycle and registry against real repositories

mod common;

use chrono::{Duration, Utc};
use common::{lines, TestRepo};
use doh_core::{
    CommitOutcome, CycleReport, DirectoryOutcome, DirectoryState, Monitor, Registry, RegistryError,
    Reporter,
};
use doh_foundation::{
    DirectoryEntry, DohConfig, InMemorySettingsStore, JsonSettingsStore, SettingsStore,
};
use std::path::{Path, PathBuf};

#[derive(Default)]
struct RecordingReporter {
    seen: Vec<(PathBuf, String)>,
    finished: bool,
}

impl Reporter for RecordingReporter {
    fn directory(&mut self, path: &Path, name: &str, _outcome: &DirectoryOutcome) {
        self.seen.push((path.to_path_buf(), name.to_string()));
    }

    fn cycle_finished(&mut self, _report: &CycleReport) {
        self.finished = true;
    }
}

fn entry(path: &Path, threshold: u64, name: &str) -> DirectoryEntry {
    let mut entry = DirectoryEntry::new(path, threshold, Some(name.to_string()));
    entry.last_checked_at = Utc::now() - Duration::days(3);
    entry
}

fn outcome_of<'a>(report: &'a CycleReport, path: &Path) -> &'a DirectoryOutcome {
    &report
        .directories
        .iter()
        .find(|d| d.path.as_path() == path)
        .unwrap()
        .outcome
}

#[test]
fn test_cycle_evaluates_every_directory() {
    let busy = TestRepo::with_initial_commit();
    busy.write("big.txt", &lines("x", 40));
    let quiet = TestRepo::with_initial_commit();
    quiet.write("small.txt", &lines("y", 2));
    let gone = PathBuf::from("/nonexistent/doh/removed-project");

    let mut config = DohConfig::new();
    config.insert_directory(busy.path().to_path_buf(), entry(busy.path(), 30, "busy"));
    config.insert_directory(quiet.path().to_path_buf(), entry(quiet.path(), 30, "quiet"));
    config.insert_directory(gone.clone(), entry(&gone, 30, "gone"));
    let store = InMemorySettingsStore::new(config);

    let mut reporter = RecordingReporter::default();
    let report = Monitor::new(&store).run_cycle(&mut reporter).unwrap();

    assert_eq!(report.directories.len(), 3);
    assert_eq!(report.committed_count(), 1);
    assert_eq!(reporter.seen.len(), 3);
    assert!(reporter.finished);

    assert!(matches!(outcome_of(&report, busy.path()), DirectoryOutcome::Committed(_)));
    assert!(matches!(
        outcome_of(&report, quiet.path()),
        DirectoryOutcome::UnderThreshold { total: 2, threshold: 30 }
    ));
    assert!(matches!(outcome_of(&report, &gone), DirectoryOutcome::Missing));

    let saved = store.snapshot();
    let recent = Utc::now() - Duration::hours(1);
    assert!(saved.directory(busy.path()).unwrap().last_checked_at > recent);
    assert!(saved.directory(quiet.path()).unwrap().last_checked_at > recent);
    assert!(saved.directory(&gone).unwrap().last_checked_at < recent);
}

#[test]
fn test_cycle_skips_directory_under_excluded_ancestor() {
    let repo = TestRepo::with_initial_commit();
    repo.write("sub/a.txt", &lines("a", 5));
    let sub = repo.path().join("sub");
    let before = repo.head("HEAD");

    let mut config = DohConfig::new();
    config.insert_directory(sub.clone(), entry(&sub, 1, "sub"));
    config.insert_exclusion(repo.path().to_path_buf(), Utc::now());
    let store = InMemorySettingsStore::new(config);

    let report = Monitor::new(&store)
        .run_cycle(&mut doh_core::NullReporter)
        .unwrap();

    match outcome_of(&report, &sub) {
        DirectoryOutcome::Excluded { excluded_by } => assert_eq!(excluded_by, repo.path()),
        other => panic!("expected the directory to be skipped, got {:?}", other),
    }
    assert_eq!(report.committed_count(), 0);
    assert_eq!(report.failed_count(), 0);
    assert_eq!(repo.head("HEAD"), before);
    assert_eq!(repo.current_branch(), "main");

    let recent = Utc::now() - Duration::hours(1);
    assert!(store.snapshot().directory(&sub).unwrap().last_checked_at < recent);
}

#[test]
fn test_check_skips_directory_under_excluded_ancestor() {
    let repo = TestRepo::with_initial_commit();
    repo.write("docs/guide.md", &lines("g", 20));
    let docs = repo.path().join("docs");
    let before = repo.head("HEAD");

    let store = InMemorySettingsStore::default();
    let registry = Registry::new(&store);
    registry.add_directory(&docs, Some(1), None).unwrap();
    registry.add_exclusion(repo.path()).unwrap();
    assert!(registry.is_monitored(&docs).unwrap());

    let outcome = Monitor::new(&store).check(&docs).unwrap();

    assert!(matches!(outcome, Some(DirectoryOutcome::Excluded { .. })));
    assert_eq!(repo.head("HEAD"), before);
}

#[test]
fn test_cycle_reports_plain_directory() {
    let plain = tempfile::TempDir::new().unwrap();
    let path = plain.path().canonicalize().unwrap();
    let mut config = DohConfig::new();
    config.insert_directory(path.clone(), entry(&path, 1, "plain"));
    let store = InMemorySettingsStore::new(config);

    let report = Monitor::new(&store)
        .run_cycle(&mut doh_core::NullReporter)
        .unwrap();

    assert!(matches!(
        report.directories[0].outcome,
        DirectoryOutcome::NotAGitRepository
    ));
    assert_eq!(report.failed_count(), 1);
}

#[test]
fn test_cycle_with_json_store() {
    let config_dir = tempfile::TempDir::new().unwrap();
    let store = JsonSettingsStore::new(config_dir.path());
    let repo = TestRepo::with_initial_commit();

    Registry::new(&store)
        .add_directory(repo.path(), Some(5), Some("json".to_string()))
        .unwrap();
    repo.write("a.txt", &lines("a", 6));

    let report = Monitor::new(&store)
        .run_cycle(&mut doh_core::TracingReporter)
        .unwrap();

    assert_eq!(report.committed_count(), 1);
    assert!(store.load().unwrap().is_monitored(repo.path()));
    assert!(!store.path().with_extension("json.lock").exists());
}

#[test]
fn test_force_commit_ignores_threshold() {
    let repo = TestRepo::with_initial_commit();
    repo.write("tiny.txt", "one line\n");
    let store = InMemorySettingsStore::default();

    let outcome = Monitor::new(&store).force_commit(repo.path()).unwrap();

    assert!(matches!(outcome, CommitOutcome::Committed { .. }));
    assert_eq!(repo.subject("HEAD"), "Manual commit: tiny.txt (+1)");
}

#[test]
fn test_force_commit_clean_repository() {
    let repo = TestRepo::with_initial_commit();
    let store = InMemorySettingsStore::default();

    let outcome = Monitor::new(&store).force_commit(repo.path()).unwrap();

    assert_eq!(outcome, CommitOutcome::NothingToCommit);
}

#[test]
fn test_status_of_monitored_directory() {
    let repo = TestRepo::with_initial_commit();
    let store = InMemorySettingsStore::default();
    Registry::new(&store)
        .add_directory(repo.path(), Some(10), None)
        .unwrap();
    let monitor = Monitor::new(&store);

    let status = monitor.status(repo.path()).unwrap();
    assert!(status.monitored);
    assert_eq!(status.state, DirectoryState::Clean);
    assert!(status.temp_branches.is_empty());

    repo.write("a.txt", &lines("a", 4));
    assert_eq!(monitor.status(repo.path()).unwrap().state, DirectoryState::Changes(4));

    repo.write("a.txt", &lines("a", 15));
    assert_eq!(
        monitor.status(repo.path()).unwrap().state,
        DirectoryState::OverThreshold(15)
    );

    monitor.run_cycle(&mut doh_core::NullReporter).unwrap();
    let status = monitor.status(repo.path()).unwrap();
    assert_eq!(status.state, DirectoryState::Clean);
    assert_eq!(status.temp_branches.len(), 1);
    assert_eq!(status.temp_branches[0].name, status.current_branch);
}

#[test]
fn test_registry_auto_init() {
    let plain = tempfile::TempDir::new().unwrap();
    let store = InMemorySettingsStore::default();
    let registry = Registry::new(&store);

    let entry = registry.add_directory(plain.path(), None, None).unwrap();

    assert!(plain.path().join(".git").exists());
    assert_eq!(entry.threshold, doh_foundation::DEFAULT_THRESHOLD);
    assert!(registry.is_monitored(plain.path()).unwrap());
}

#[test]
fn test_registry_re_add_keeps_added_at() {
    let repo = TestRepo::with_initial_commit();
    let store = InMemorySettingsStore::default();
    let registry = Registry::new(&store);

    let first = registry.add_directory(repo.path(), Some(10), None).unwrap();
    let second = registry
        .add_directory(repo.path(), Some(50), Some("renamed".to_string()))
        .unwrap();

    assert_eq!(second.added_at, first.added_at);
    assert_eq!(second.threshold, 50);
    assert_eq!(second.name, "renamed");
    assert_eq!(registry.directories().unwrap().len(), 1);
}

#[test]
fn test_registry_nested_exclusion_message() {
    let repo = TestRepo::with_initial_commit();
    let nested = repo.path().join("sub");
    std::fs::create_dir(&nested).unwrap();
    let store = InMemorySettingsStore::default();
    let registry = Registry::new(&store);
    registry.add_exclusion(repo.path()).unwrap();

    let err = registry.add_directory(&nested, None, None).unwrap_err();

    assert!(matches!(err, RegistryError::Excluded { .. }));
    assert!(err.is_nested());
    assert!(err.to_string().contains(&repo.path().display().to_string()));
    assert_eq!(
        registry.find_excluded_parent(&nested).unwrap(),
        Some(repo.path().to_path_buf())
    );
}
