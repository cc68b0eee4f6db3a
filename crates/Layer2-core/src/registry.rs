//! Monitoring set
//!
//! Adds and removes monitored directories and exclusions through a
//! `SettingsStore`. Adding a directory is gated by the exclusion set and
//! requires a repository, which is created on demand when `autoInitGit` is on.

use chrono::Utc;
use doh_foundation::{DirectoryEntry, ExclusionEntry, GlobalSettings, SettingsStore};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::exclusion::find_excluded_parent;
use crate::git::{GitError, GitOps};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("{}", excluded_message(.path, .excluded_by))]
    Excluded { path: PathBuf, excluded_by: PathBuf },

    #[error("Not a git repository: {} (enable autoInitGit or run `git init`)", .0.display())]
    NotAGitRepository(PathBuf),

    #[error("Directory does not exist: {}", .0.display())]
    MissingDirectory(PathBuf),

    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Store(#[from] doh_foundation::Error),
}

impl RegistryError {
    /// Excluded through an ancestor rather than directly
    pub fn is_nested(&self) -> bool {
        matches!(self, RegistryError::Excluded { path, excluded_by } if path != excluded_by)
    }
}

fn excluded_message(path: &Path, excluded_by: &Path) -> String {
    if path == excluded_by {
        format!(
            "{} is excluded from monitoring; remove the exclusion first",
            path.display()
        )
    } else {
        format!(
            "{} is inside excluded directory {}",
            path.display(),
            excluded_by.display()
        )
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;

/// Canonical form of a path that exists, otherwise the path made absolute
pub fn resolve_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Monitored directories and exclusions backed by a settings store
pub struct Registry<'a, S: SettingsStore> {
    store: &'a S,
}

impl<'a, S: SettingsStore> Registry<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Start monitoring `path`. `threshold` defaults to the global default.
    /// Re-adding a monitored directory updates it and keeps `addedAt`.
    pub fn add_directory(
        &self,
        path: &Path,
        threshold: Option<u64>,
        name: Option<String>,
    ) -> Result<DirectoryEntry> {
        let path = path
            .canonicalize()
            .map_err(|_| RegistryError::MissingDirectory(path.to_path_buf()))?;
        if !path.is_dir() {
            return Err(RegistryError::MissingDirectory(path));
        }

        let config = self.store.load()?;
        if let Some(excluded_by) = find_excluded_parent(&path, &config.exclusions) {
            return Err(RegistryError::Excluded { path, excluded_by });
        }

        if !GitOps::is_repo(&path) {
            if !config.global_settings.auto_init_git {
                return Err(RegistryError::NotAGitRepository(path));
            }
            GitOps::init(&path)?;
            info!("Initialized git repository in {}", path.display());
        }

        let threshold = threshold.unwrap_or(config.global_settings.default_threshold);
        let mut entry = DirectoryEntry::new(&path, threshold, name);

        let key = path.clone();
        let entry = self.store.modify(move |config| {
            if let Some(existing) = config.directory(&key) {
                entry.added_at = existing.added_at;
            }
            config.insert_directory(key, entry.clone());
            Ok(entry)
        })?;

        info!("Monitoring {} (threshold {} lines)", path.display(), entry.threshold);
        Ok(entry)
    }

    /// Forget `path` as a monitored directory and as an exclusion
    pub fn remove_directory(&self, path: &Path) -> Result<bool> {
        let path = resolve_path(path);
        let removed = self.store.modify(|config| {
            let monitored = config.remove_directory(&path);
            let excluded = config.remove_exclusion(&path);
            Ok(monitored || excluded)
        })?;
        if removed {
            info!("Removed {} from monitoring", path.display());
        }
        Ok(removed)
    }

    /// Exclude `path` and its descendants; stops monitoring `path` itself
    pub fn add_exclusion(&self, path: &Path) -> Result<PathBuf> {
        let path = resolve_path(path);
        let key = path.clone();
        self.store.modify(move |config| {
            config.insert_exclusion(key, Utc::now());
            Ok(())
        })?;
        info!("Excluded {}", path.display());
        Ok(path)
    }

    pub fn remove_exclusion(&self, path: &Path) -> Result<bool> {
        let path = resolve_path(path);
        Ok(self.store.modify(|config| Ok(config.remove_exclusion(&path)))?)
    }

    pub fn is_monitored(&self, path: &Path) -> Result<bool> {
        Ok(self.store.load()?.is_monitored(&resolve_path(path)))
    }

    pub fn is_excluded(&self, path: &Path) -> Result<bool> {
        Ok(self.find_excluded_parent(path)?.is_some())
    }

    /// The path itself if excluded, else its nearest excluded ancestor
    pub fn find_excluded_parent(&self, path: &Path) -> Result<Option<PathBuf>> {
        let config = self.store.load()?;
        Ok(find_excluded_parent(&resolve_path(path), &config.exclusions))
    }

    pub fn directory(&self, path: &Path) -> Result<Option<DirectoryEntry>> {
        Ok(self.store.load()?.directory(&resolve_path(path)).cloned())
    }

    /// Monitored directories in path order
    pub fn directories(&self) -> Result<Vec<(PathBuf, DirectoryEntry)>> {
        Ok(self.store.load()?.directories.into_iter().collect())
    }

    /// Exclusions in path order
    pub fn exclusions(&self) -> Result<Vec<(PathBuf, ExclusionEntry)>> {
        Ok(self.store.load()?.exclusions.into_iter().collect())
    }

    pub fn settings(&self) -> Result<GlobalSettings> {
        Ok(self.store.load()?.global_settings)
    }

    /// Mutate the global settings and persist them
    pub fn update_settings<F>(&self, f: F) -> Result<GlobalSettings>
    where
        F: FnOnce(&mut GlobalSettings) -> doh_foundation::Result<()>,
    {
        Ok(self.store.modify(|config| {
            f(&mut config.global_settings)?;
            Ok(config.global_settings.clone())
        })?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doh_foundation::InMemorySettingsStore;
    use tempfile::TempDir;

    #[test]
    fn test_add_excluded_directory_is_rejected() {
        let temp = TempDir::new().unwrap();
        let store = InMemorySettingsStore::default();
        let registry = Registry::new(&store);

        let dir = temp.path().canonicalize().unwrap();
        registry.add_exclusion(&dir).unwrap();

        let err = registry.add_directory(&dir, None, None).unwrap_err();
        assert!(matches!(err, RegistryError::Excluded { .. }));
        assert!(!err.is_nested());
        assert!(store.snapshot().directories.is_empty());
    }

    #[test]
    fn test_add_nested_in_excluded_tree() {
        let temp = TempDir::new().unwrap();
        let child = temp.path().join("child");
        std::fs::create_dir(&child).unwrap();

        let store = InMemorySettingsStore::default();
        let registry = Registry::new(&store);
        registry.add_exclusion(temp.path()).unwrap();

        let err = registry.add_directory(&child, None, None).unwrap_err();
        assert!(err.is_nested());
        match err {
            RegistryError::Excluded { excluded_by, .. } => {
                assert_eq!(excluded_by, temp.path().canonicalize().unwrap());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_add_without_auto_init_requires_repository() {
        let temp = TempDir::new().unwrap();
        let store = InMemorySettingsStore::default();
        let registry = Registry::new(&store);
        registry
            .update_settings(|settings| {
                settings.auto_init_git = false;
                Ok(())
            })
            .unwrap();

        let err = registry.add_directory(temp.path(), None, None).unwrap_err();
        assert!(matches!(err, RegistryError::NotAGitRepository(_)));
    }

    #[test]
    fn test_add_missing_directory() {
        let store = InMemorySettingsStore::default();
        let registry = Registry::new(&store);
        let err = registry
            .add_directory(Path::new("/nonexistent/doh/dir"), None, None)
            .unwrap_err();
        assert!(matches!(err, RegistryError::MissingDirectory(_)));
    }

    #[test]
    fn test_exclusion_drops_monitoring_and_remove_clears_both() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().canonicalize().unwrap();

        let mut config = doh_foundation::DohConfig::new();
        config.insert_directory(dir.clone(), DirectoryEntry::new(&dir, 10, None));
        let store = InMemorySettingsStore::new(config);
        let registry = Registry::new(&store);

        registry.add_exclusion(&dir).unwrap();
        assert!(!registry.is_monitored(&dir).unwrap());
        assert!(registry.is_excluded(&dir).unwrap());

        assert!(registry.remove_directory(&dir).unwrap());
        assert!(!registry.is_excluded(&dir).unwrap());
        assert!(!registry.remove_directory(&dir).unwrap());
    }
}
