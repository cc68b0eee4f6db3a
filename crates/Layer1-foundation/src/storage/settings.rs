//! Settings store interface
//!
//! The core only sees `SettingsStore`; file mechanics (atomic replace, backups,
//! the advisory lock) live in `JsonSettingsStore`.

use crate::config::{DohConfig, DOH_CONFIG_FILE};
use crate::Result;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::time::Duration;

use super::json::JsonStore;
use super::lock::StoreLock;

/// Default wait for a contended store lock
const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Load/save access to the persisted monitoring state
pub trait SettingsStore {
    /// Load the document; a missing document loads as defaults
    fn load(&self) -> Result<DohConfig>;

    /// Replace the document
    fn save(&self, config: &DohConfig) -> Result<()>;

    /// Load, mutate and save as one step. Nothing is saved when `f` fails.
    fn modify<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut DohConfig) -> Result<R>,
        Self: Sized,
    {
        let mut config = self.load()?;
        let result = f(&mut config)?;
        self.save(&config)?;
        Ok(result)
    }
}

// ============================================================================
// JSON file store
// ============================================================================

/// Settings persisted as `config.json`, single writer enforced by a lock file
#[derive(Debug, Clone)]
pub struct JsonSettingsStore {
    store: JsonStore,
    lock_timeout: Duration,
}

impl JsonSettingsStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            store: JsonStore::new(base_dir),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    /// Store in the global settings directory
    pub fn global() -> Result<Self> {
        Ok(Self {
            store: JsonStore::global()?,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        })
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Settings file path
    pub fn path(&self) -> PathBuf {
        self.store.file_path(DOH_CONFIG_FILE)
    }

    pub fn base_dir(&self) -> &std::path::Path {
        self.store.base_dir()
    }

    fn lock(&self) -> Result<StoreLock> {
        self.store.ensure_dir()?;
        let lock_path = self.store.file_path(&format!("{}.lock", DOH_CONFIG_FILE));
        StoreLock::acquire(lock_path, self.lock_timeout)
    }

    fn read(&self) -> Result<DohConfig> {
        Ok(self
            .store
            .load_optional::<DohConfig>(DOH_CONFIG_FILE)?
            .unwrap_or_default())
    }
}

impl SettingsStore for JsonSettingsStore {
    fn load(&self) -> Result<DohConfig> {
        self.read()
    }

    fn save(&self, config: &DohConfig) -> Result<()> {
        let _lock = self.lock()?;
        self.store.save(DOH_CONFIG_FILE, config)
    }

    fn modify<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut DohConfig) -> Result<R>,
    {
        let _lock = self.lock()?;
        let mut config = self.read()?;
        let result = f(&mut config)?;
        self.store.save(DOH_CONFIG_FILE, &config)?;
        Ok(result)
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// Settings held in memory, for embedding and tests
#[derive(Debug, Default)]
pub struct InMemorySettingsStore {
    config: Mutex<DohConfig>,
}

impl InMemorySettingsStore {
    pub fn new(config: DohConfig) -> Self {
        Self {
            config: Mutex::new(config),
        }
    }

    /// Current document
    pub fn snapshot(&self) -> DohConfig {
        self.config.lock().clone()
    }
}

impl SettingsStore for InMemorySettingsStore {
    fn load(&self) -> Result<DohConfig> {
        Ok(self.config.lock().clone())
    }

    fn save(&self, config: &DohConfig) -> Result<()> {
        *self.config.lock() = config.clone();
        Ok(())
    }

    fn modify<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut DohConfig) -> Result<R>,
    {
        let mut guard = self.config.lock();
        let mut config = guard.clone();
        let result = f(&mut config)?;
        *guard = config;
        Ok(result)
    }
}
