//! Scratch repositories for integration tests

#![allow(dead_code)]

use doh_core::GitOps;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

pub struct TestRepo {
    _temp: TempDir,
    path: PathBuf,
}

impl TestRepo {
    /// Empty repository on `main` with a local identity
    pub fn init() -> Self {
        let temp = TempDir::new().unwrap();
        let path = temp.path().canonicalize().unwrap();
        let repo = Self { _temp: temp, path };

        repo.git(&["init", "--quiet"]);
        repo.git(&["symbolic-ref", "HEAD", "refs/heads/main"]);
        repo.git(&["config", "user.name", "DOH Test"]);
        repo.git(&["config", "user.email", "test@doh.local"]);
        repo.git(&["config", "commit.gpgsign", "false"]);
        repo
    }

    /// Repository with `README.md` committed on `main`
    pub fn with_initial_commit() -> Self {
        let repo = Self::init();
        repo.write("README.md", "# test\n");
        repo.commit_all("Initial commit");
        repo
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn ops(&self) -> GitOps {
        GitOps::new(&self.path)
    }

    pub fn write(&self, relative: &str, content: &str) {
        let file = self.path.join(relative);
        if let Some(parent) = file.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(file, content).unwrap();
    }

    pub fn write_bytes(&self, relative: &str, content: &[u8]) {
        std::fs::write(self.path.join(relative), content).unwrap();
    }

    /// Run git in the repository, panicking on failure
    pub fn git(&self, args: &[&str]) -> String {
        self.git_with_env(args, &[])
    }

    pub fn git_with_env(&self, args: &[&str], env: &[(&str, &str)]) -> String {
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.path)
            .args(args)
            .envs(env.iter().copied())
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }

    pub fn commit_all(&self, message: &str) {
        self.git(&["add", "-A"]);
        self.git(&["commit", "--quiet", "-m", message]);
    }

    /// Commit everything with author and committer dates set to `date`
    pub fn commit_all_at(&self, message: &str, date: &str) {
        self.git(&["add", "-A"]);
        self.git_with_env(
            &["commit", "--quiet", "-m", message],
            &[("GIT_AUTHOR_DATE", date), ("GIT_COMMITTER_DATE", date)],
        );
    }

    pub fn current_branch(&self) -> String {
        self.git(&["branch", "--show-current"])
    }

    pub fn head(&self, rev: &str) -> String {
        self.git(&["rev-parse", rev])
    }

    pub fn commit_count(&self, rev: &str) -> u64 {
        self.git(&["rev-list", "--count", rev]).parse().unwrap()
    }

    pub fn branches(&self) -> Vec<String> {
        self.git(&["branch", "--format=%(refname:short)"])
            .lines()
            .map(str::to_string)
            .collect()
    }

    pub fn subject(&self, rev: &str) -> String {
        self.git(&["log", "-1", "--format=%s", rev])
    }
}

/// `count` numbered lines, newline terminated
pub fn lines(prefix: &str, count: usize) -> String {
    (1..=count).map(|i| format!("{} {}\n", prefix, i)).collect()
}
