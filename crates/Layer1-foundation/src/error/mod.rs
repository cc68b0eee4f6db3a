//! Error types for DOH
//!
//! Errors shared by every layer that touches persisted settings.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// DOH foundation error type
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Settings
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // Storage
    // ========================================================================
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Settings store is locked by another process: {}", .0.display())]
    Locked(PathBuf),

    // ========================================================================
    // General
    // ========================================================================
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ========================================================================
    // Conversions
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
