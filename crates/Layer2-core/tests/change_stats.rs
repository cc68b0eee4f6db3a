//! Change statistics against real repositories

mod common;

use common::{lines, TestRepo};
use doh_core::{ChangeStatsCollector, FileChange, FileStatus, GitError};

#[test]
fn test_fresh_repository_counts_staged_lines() {
    let repo = TestRepo::init();
    repo.write("a.txt", &lines("a", 10));
    repo.git(&["add", "a.txt"]);

    let stats = ChangeStatsCollector::new(repo.ops()).collect().unwrap();

    assert!(!stats.has_head);
    assert_eq!(stats.total_changes(), 10);
    assert_eq!(
        stats.file_stats,
        vec![FileChange::new("a.txt", 10, 0, FileStatus::New)]
    );
}

#[test]
fn test_fresh_repository_ignores_untracked_in_total() {
    let repo = TestRepo::init();
    repo.write("staged.txt", &lines("s", 4));
    repo.git(&["add", "staged.txt"]);
    repo.write("loose.txt", &lines("l", 6));

    let stats = ChangeStatsCollector::new(repo.ops()).collect().unwrap();

    assert_eq!(stats.untracked_count, 1);
    assert_eq!(stats.untracked_lines, 6);
    assert_eq!(stats.total_changes(), 4);
}

#[test]
fn test_modified_and_untracked() {
    let repo = TestRepo::with_initial_commit();
    repo.write("b.txt", &lines("old", 10));
    repo.commit_all("add b");

    // drop the first two lines, append five
    let mut content: String = lines("old", 10).lines().skip(2).map(|l| format!("{}\n", l)).collect();
    content.push_str(&lines("new", 5));
    repo.write("b.txt", &content);
    repo.write("c.txt", &lines("c", 3));

    let stats = ChangeStatsCollector::new(repo.ops()).collect().unwrap();

    assert_eq!(stats.tracked_added + stats.tracked_deleted, 7);
    assert_eq!(stats.tracked_added, 5);
    assert_eq!(stats.tracked_deleted, 2);
    assert_eq!(stats.files_changed, 1);
    assert_eq!(stats.untracked_count, 1);
    assert_eq!(stats.untracked_lines, 3);
    assert_eq!(stats.total_changes(), 10);

    assert!(stats
        .file_stats
        .contains(&FileChange::new("b.txt", 5, 2, FileStatus::Modified)));
    assert!(stats
        .file_stats
        .contains(&FileChange::new("c.txt", 3, 0, FileStatus::New)));
}

#[test]
fn test_clean_repository() {
    let repo = TestRepo::with_initial_commit();
    let stats = ChangeStatsCollector::new(repo.ops()).collect().unwrap();

    assert!(stats.is_clean());
    assert_eq!(stats.total_changes(), 0);
}

#[test]
fn test_status_from_name_status() {
    let repo = TestRepo::with_initial_commit();
    repo.write("gone.txt", &lines("g", 4));
    repo.write("keep.txt", &lines("k", 2));
    repo.commit_all("add files");

    repo.git(&["rm", "--quiet", "gone.txt"]);
    repo.write("added.txt", &lines("n", 3));
    repo.git(&["add", "added.txt"]);
    repo.write("keep.txt", &format!("{}{}", lines("k", 2), lines("more", 2)));

    let stats = ChangeStatsCollector::new(repo.ops()).collect().unwrap();
    let status_of = |path: &str| {
        stats
            .file_stats
            .iter()
            .find(|f| f.path == path)
            .map(|f| f.status)
    };

    assert_eq!(status_of("gone.txt"), Some(FileStatus::Deleted));
    assert_eq!(status_of("added.txt"), Some(FileStatus::New));
    assert_eq!(status_of("keep.txt"), Some(FileStatus::Modified));
    assert_eq!(stats.total_changes(), 4 + 3 + 2);
}

#[test]
fn test_binary_and_ignored_untracked_files() {
    let repo = TestRepo::init();
    repo.write(".gitignore", "*.log\n");
    repo.commit_all("ignore logs");

    repo.write("debug.log", &lines("log", 50));
    repo.write_bytes("image.bin", &[0x89, 0x50, 0x00, 0x47]);
    repo.write("empty.txt", "");

    let stats = ChangeStatsCollector::new(repo.ops()).collect().unwrap();

    assert_eq!(stats.untracked_count, 2);
    assert_eq!(stats.untracked_lines, 1);
    assert!(stats.file_stats.iter().all(|f| f.path != "debug.log"));
}

#[test]
fn test_untracked_in_subdirectory() {
    let repo = TestRepo::with_initial_commit();
    repo.write("src/lib.rs", &lines("fn", 7));

    let stats = ChangeStatsCollector::new(repo.ops()).collect().unwrap();

    assert_eq!(stats.untracked_count, 1);
    assert_eq!(stats.untracked_lines, 7);
    assert_eq!(stats.file_stats[0].path, "src/lib.rs");
}

#[test]
fn test_subdirectory_measures_only_its_own_changes() {
    let repo = TestRepo::init();
    repo.write("docs/notes.txt", "first\n");
    repo.write("src/other.rs", "fn main() {}\n");
    repo.commit_all("layout");

    repo.write("docs/notes.txt", &lines("note", 4));
    repo.write("docs/new.md", &lines("new", 2));
    repo.write("src/other.rs", &lines("wip", 50));
    repo.write("src/scratch.rs", &lines("tmp", 30));

    let docs = doh_core::GitOps::new(repo.path().join("docs"));
    let stats = ChangeStatsCollector::new(docs).collect().unwrap();

    // notes.txt: +4 -1, new.md: 2 untracked lines
    assert_eq!(stats.files_changed, 1);
    assert_eq!(stats.untracked_count, 1);
    assert_eq!(stats.total_changes(), 4 + 1 + 2);

    let paths: Vec<&str> = stats.file_stats.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec!["notes.txt", "new.md"]);
}

#[test]
fn test_modified_binary_counts_one_line() {
    let repo = TestRepo::init();
    repo.write_bytes("logo.bin", &[0x89, 0x50, 0x00, 0x47]);
    repo.commit_all("logo");

    repo.write_bytes("logo.bin", &[0x89, 0x50, 0x00, 0x48, 0x00]);
    let stats = ChangeStatsCollector::new(repo.ops()).collect().unwrap();

    assert_eq!(stats.files_changed, 1);
    assert_eq!(stats.total_changes(), 1);
    assert_eq!(
        stats.file_stats,
        vec![FileChange::new("logo.bin", 1, 0, FileStatus::Modified)]
    );
}

#[test]
fn test_plain_directory_is_not_a_repository() {
    let temp = tempfile::TempDir::new().unwrap();
    let result = doh_core::git::stats::collect(temp.path());
    assert!(matches!(result, Err(GitError::NotARepository(_))));
}
