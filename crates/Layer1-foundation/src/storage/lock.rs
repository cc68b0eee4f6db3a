//! Advisory lock file guarding the settings store
//!
//! Periodic runs and interactive commands may touch the same settings file.
//! The lock is a file created with `create_new`; it is removed when the guard
//! drops. A lock file older than `STALE_AFTER` belongs to a dead process and is
//! broken.

use crate::{Error, Result};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const RETRY_INTERVAL: Duration = Duration::from_millis(50);
const STALE_AFTER: Duration = Duration::from_secs(60);

/// Held lock on the settings store
#[derive(Debug)]
pub struct StoreLock {
    path: PathBuf,
}

impl StoreLock {
    /// Acquire the lock, retrying until `timeout` elapses
    pub fn acquire(path: impl Into<PathBuf>, timeout: Duration) -> Result<Self> {
        let path = path.into();
        let deadline = Instant::now() + timeout;

        loop {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    // pid is informational only
                    let _ = writeln!(file, "{}", std::process::id());
                    debug!("Acquired store lock {}", path.display());
                    return Ok(Self { path });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if is_stale(&path) {
                        warn!("Breaking stale store lock {}", path.display());
                        let _ = std::fs::remove_file(&path);
                        continue;
                    }
                    if Instant::now() >= deadline {
                        return Err(Error::Locked(path));
                    }
                    thread::sleep(RETRY_INTERVAL);
                }
                Err(e) => {
                    return Err(Error::Storage(format!(
                        "Failed to create lock {}: {}",
                        path.display(),
                        e
                    )))
                }
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            debug!("Failed to release store lock {}: {}", self.path.display(), e);
        }
    }
}

fn is_stale(path: &Path) -> bool {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|modified| modified.elapsed().ok())
        .map(|age| age > STALE_AFTER)
        .unwrap_or(false)
}
