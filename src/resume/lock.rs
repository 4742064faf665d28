//! Advisory run locking.
//!
//! Two concurrent runs over the same output tree would race each other's
//! range audits and writes. An fd-lock on a well-known file in the defendant
//! directory makes the second run fail fast instead.

use super::ResumeError;
use fd_lock::{RwLock, RwLockWriteGuard};
use std::fs::{File, OpenOptions};
use std::path::Path;

const LOCK_FILE: &str = ".harvest.lock";

/// Exclusive advisory lock over an output directory.
///
/// Open the lock, then [`hold`](Self::hold) it for the duration of the run;
/// the guard releases on drop.
pub struct HarvestLock {
    lock: RwLock<File>,
}

impl HarvestLock {
    /// Open (creating if needed) the lock file inside `dir`.
    pub fn open(dir: &Path) -> Result<Self, ResumeError> {
        std::fs::create_dir_all(dir).map_err(|e| ResumeError::IoError(e.to_string()))?;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(dir.join(LOCK_FILE))
            .map_err(|e| ResumeError::LockError(format!("failed to open lock file: {e}")))?;
        Ok(Self {
            lock: RwLock::new(file),
        })
    }

    /// Take the lock without blocking; fails when another run holds it.
    pub fn hold(&mut self) -> Result<RwLockWriteGuard<'_, File>, ResumeError> {
        self.lock
            .try_write()
            .map_err(|e| ResumeError::LockError(format!("another run holds the output lock: {e}")))
    }
}
