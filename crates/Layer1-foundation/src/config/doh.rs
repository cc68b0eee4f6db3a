//! DOH Config - the persisted monitoring state
//!
//! One document holds the global settings, the monitored directories and the
//! exclusions. Directory and exclusion maps are keyed by canonical absolute path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::settings::{GlobalSettings, DEFAULT_THRESHOLD};

/// Settings file name
pub const DOH_CONFIG_FILE: &str = "config.json";

/// Current document version
pub const CONFIG_VERSION: u32 = 1;

// ============================================================================
// DohConfig
// ============================================================================

/// Persisted monitoring state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DohConfig {
    /// Version (for migrations)
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub global_settings: GlobalSettings,

    /// Monitored directories
    #[serde(default)]
    pub directories: BTreeMap<PathBuf, DirectoryEntry>,

    /// Directories opted out of monitoring, inherited by descendants
    #[serde(default)]
    pub exclusions: BTreeMap<PathBuf, ExclusionEntry>,
}

impl Default for DohConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            global_settings: GlobalSettings::default(),
            directories: BTreeMap::new(),
            exclusions: BTreeMap::new(),
        }
    }
}

impl DohConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn directory(&self, path: &Path) -> Option<&DirectoryEntry> {
        self.directories.get(path)
    }

    pub fn is_monitored(&self, path: &Path) -> bool {
        self.directories.contains_key(path)
    }

    /// Record a monitored directory, replacing any previous entry for the path
    pub fn insert_directory(&mut self, path: PathBuf, entry: DirectoryEntry) {
        self.directories.insert(path, entry);
    }

    /// Remove a monitored directory; returns whether it was present
    pub fn remove_directory(&mut self, path: &Path) -> bool {
        self.directories.remove(path).is_some()
    }

    /// Record an exclusion. A path is never both monitored and excluded, so any
    /// directory entry for the same path is dropped.
    pub fn insert_exclusion(&mut self, path: PathBuf, excluded_at: DateTime<Utc>) {
        self.directories.remove(&path);
        self.exclusions.insert(path, ExclusionEntry { excluded_at });
    }

    /// Remove an exclusion; returns whether it was present
    pub fn remove_exclusion(&mut self, path: &Path) -> bool {
        self.exclusions.remove(path).is_some()
    }

    /// Mark a directory as just evaluated
    pub fn touch_directory(&mut self, path: &Path, at: DateTime<Utc>) -> bool {
        match self.directories.get_mut(path) {
            Some(entry) => {
                entry.last_checked_at = at;
                true
            }
            None => false,
        }
    }
}

// ============================================================================
// Entries
// ============================================================================

/// A monitored directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    /// Display label; empty means "use the last path segment"
    #[serde(default)]
    pub name: String,

    /// Line-change count that triggers an automatic commit
    #[serde(default = "default_threshold")]
    pub threshold: u64,

    #[serde(default = "Utc::now")]
    pub added_at: DateTime<Utc>,

    #[serde(default = "Utc::now")]
    pub last_checked_at: DateTime<Utc>,
}

impl DirectoryEntry {
    pub fn new(path: &Path, threshold: u64, name: Option<String>) -> Self {
        let now = Utc::now();
        let name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| default_name(path));
        Self {
            name,
            threshold,
            added_at: now,
            last_checked_at: now,
        }
    }

    /// Name to show for this entry
    pub fn display_name(&self, path: &Path) -> String {
        if self.name.trim().is_empty() {
            default_name(path)
        } else {
            self.name.clone()
        }
    }
}

/// An excluded directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExclusionEntry {
    #[serde(default = "Utc::now")]
    pub excluded_at: DateTime<Utc>,
}

/// Last path segment, or the whole path for roots
pub fn default_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

fn default_threshold() -> u64 {
    DEFAULT_THRESHOLD
}
