//! # doh-foundation
//!
//! Foundation layer for DOH:
//! - Error: shared error type for settings and storage
//! - Config: persisted model (GlobalSettings, DirectoryEntry, ExclusionEntry)
//! - Storage: JsonStore (atomic JSON files), SettingsStore (load/save/modify)
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  doh-core (registry, monitor, git engine)    │
//! │                     │                        │
//! │                     ▼                        │
//! │           SettingsStore (trait)              │
//! │          ┌──────────┴──────────┐             │
//! │          ▼                     ▼             │
//! │  JsonSettingsStore     InMemorySettingsStore │
//! │  (lock + atomic write)                       │
//! └──────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod storage;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Config
// ============================================================================
pub use config::{
    default_name, expand_home, DirectoryEntry, DohConfig, ExclusionEntry, GlobalSettings,
    CONFIG_VERSION, DEFAULT_TEMP_BRANCH_PREFIX, DEFAULT_THRESHOLD, DOH_CONFIG_FILE,
};

// ============================================================================
// Storage
// ============================================================================
pub use storage::{
    InMemorySettingsStore, JsonSettingsStore, JsonStore, SettingsStore, StoreLock,
    CONFIG_DIR_ENV,
};
