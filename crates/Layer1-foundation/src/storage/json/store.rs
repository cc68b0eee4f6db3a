//! JSON file store
//!
//! Writes go to a sibling temp file first and are renamed into place, so a
//! reader never observes a half-written document. The previous two versions of
//! each file are kept as `<file>.backup.1` and `<file>.backup.2`.

use crate::{Error, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable overriding the global settings directory
pub const CONFIG_DIR_ENV: &str = "DOH_CONFIG_DIR";

/// Number of rotated backups kept per file
const BACKUP_COUNT: usize = 2;

/// JSON file store rooted at one directory
#[derive(Debug, Clone)]
pub struct JsonStore {
    base_dir: PathBuf,
}

impl JsonStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Global store (`$DOH_CONFIG_DIR`, else `~/.doh/`)
    pub fn global() -> Result<Self> {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|d| !d.is_empty()) {
            return Ok(Self::new(dir));
        }
        let dir = dirs::home_dir()
            .ok_or_else(|| Error::Config("Cannot find home directory".to_string()))?
            .join(".doh");
        Ok(Self::new(dir))
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn file_path(&self, filename: &str) -> PathBuf {
        self.base_dir.join(filename)
    }

    /// Path of the n-th backup (1 = most recent)
    pub fn backup_path(&self, filename: &str, n: usize) -> PathBuf {
        self.base_dir.join(format!("{}.backup.{}", filename, n))
    }

    pub(crate) fn ensure_dir(&self) -> Result<()> {
        if !self.base_dir.exists() {
            std::fs::create_dir_all(&self.base_dir)
                .map_err(|e| Error::Config(format!("Failed to create directory: {}", e)))?;
        }
        Ok(())
    }

    /// Load JSON
    pub fn load<T: DeserializeOwned>(&self, filename: &str) -> Result<T> {
        let path = self.file_path(filename);
        let content = std::fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Load JSON, `None` when the file does not exist
    pub fn load_optional<T: DeserializeOwned>(&self, filename: &str) -> Result<Option<T>> {
        let path = self.file_path(filename);
        if !path.exists() {
            return Ok(None);
        }
        self.load(filename).map(Some)
    }

    /// Save JSON atomically, rotating backups of the previous content
    pub fn save<T: Serialize>(&self, filename: &str, data: &T) -> Result<()> {
        self.ensure_dir()?;
        let path = self.file_path(filename);
        let content = serde_json::to_string_pretty(data)
            .map_err(|e| Error::Config(format!("Failed to serialize: {}", e)))?;

        let tmp = self.base_dir.join(format!("{}.tmp", filename));
        std::fs::write(&tmp, content)
            .map_err(|e| Error::Storage(format!("Failed to write {}: {}", tmp.display(), e)))?;

        if path.exists() {
            self.rotate_backups(filename)?;
        }

        std::fs::rename(&tmp, &path).map_err(|e| {
            Error::Storage(format!("Failed to replace {}: {}", path.display(), e))
        })?;
        debug!("Saved {}", path.display());
        Ok(())
    }

    fn rotate_backups(&self, filename: &str) -> Result<()> {
        for n in (1..BACKUP_COUNT).rev() {
            let from = self.backup_path(filename, n);
            if from.exists() {
                std::fs::rename(&from, self.backup_path(filename, n + 1)).map_err(|e| {
                    Error::Storage(format!("Failed to rotate {}: {}", from.display(), e))
                })?;
            }
        }
        let current = self.file_path(filename);
        std::fs::copy(&current, self.backup_path(filename, 1)).map_err(|e| {
            Error::Storage(format!("Failed to back up {}: {}", current.display(), e))
        })?;
        Ok(())
    }
}
