//! Storage module for DOH
//!
//! - `json`: JSON files with atomic replace and backup rotation
//! - `lock`: advisory lock file for single-writer access
//! - `settings`: `SettingsStore` interface and its implementations

mod json {
    mod store;

    pub use store::{JsonStore, CONFIG_DIR_ENV};
}
mod lock;
mod settings;

pub use json::{JsonStore, CONFIG_DIR_ENV};
pub use lock::StoreLock;
pub use settings::{InMemorySettingsStore, JsonSettingsStore, SettingsStore};
