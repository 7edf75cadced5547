//! Advisory `fs2` locks on a workspace directory.
//!
//! - [`WorkspaceLock`] (`.upgrade.lock`): the engine assumes a single upgrade
//!   runs per workspace at a time, and a process-level caller enforces that by
//!   holding this lock for the whole run. Acquisition never waits.
//! - `StoreLock` (`.store.lock`): held by the file store around each
//!   read-modify-write of a domain file. Acquisition waits for the holder.

use crate::storage::atomic_file::io_context;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use stratum_core::{Result, StratumError};

const LOCK_FILE_NAME: &str = ".upgrade.lock";
const STORE_LOCK_FILE_NAME: &str = ".store.lock";

/// Exclusive upgrade lock guard for one workspace directory.
#[derive(Debug)]
pub struct WorkspaceLock {
    file: File,
    lock_path: PathBuf,
}

impl WorkspaceLock {
    /// Takes the lock without blocking.
    ///
    /// # Errors
    ///
    /// Returns `StratumError::Locked` when another holder (in this or another
    /// process) already owns the lock.
    pub fn acquire(workspace_dir: &Path) -> Result<Self> {
        fs::create_dir_all(workspace_dir)
            .map_err(|e| io_context(e, "create directory", workspace_dir))?;

        let lock_path = workspace_dir.join(LOCK_FILE_NAME);
        let file = open_lock_file(&lock_path)?;

        file.try_lock_exclusive().map_err(|e| {
            StratumError::Locked(format!(
                "{} is held by another upgrade ({})",
                lock_path.display(),
                e
            ))
        })?;

        tracing::debug!("Acquired upgrade lock {}", lock_path.display());
        Ok(Self { file, lock_path })
    }

    pub fn path(&self) -> &Path {
        &self.lock_path
    }
}

impl Drop for WorkspaceLock {
    fn drop(&mut self) {
        // The lock file itself stays; removing it would race with a waiting acquirer.
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!("Failed to release upgrade lock {}: {}", self.lock_path.display(), e);
        }
    }
}

/// Exclusive guard over one read-modify-write cycle of a file store.
///
/// `flock` locks belong to the open file, so two store handles on the same
/// directory exclude each other whether they live in one process or two.
#[derive(Debug)]
pub(crate) struct StoreLock {
    file: File,
    lock_path: PathBuf,
}

impl StoreLock {
    /// Waits until the store at `root` is free and takes it.
    pub(crate) async fn acquire(root: &Path) -> Result<Self> {
        let lock_path = root.join(STORE_LOCK_FILE_NAME);

        tokio::task::spawn_blocking(move || {
            let file = open_lock_file(&lock_path)?;
            file.lock_exclusive()
                .map_err(|e| io_context(e, "lock", &lock_path))?;
            Ok(Self { file, lock_path })
        })
        .await
        .map_err(|e| StratumError::internal(format!("Store lock task failed: {}", e)))?
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!("Failed to release store lock {}: {}", self.lock_path.display(), e);
        }
    }
}

fn open_lock_file(lock_path: &Path) -> Result<File> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path)
        .map_err(|e| io_context(e, "open", lock_path))
}
