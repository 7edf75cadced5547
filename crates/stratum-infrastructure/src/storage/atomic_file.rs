//! Atomic JSON file operations.
//!
//! Every save goes through a temporary file in the same directory, is flushed
//! with `sync_all` and then renamed over the target, so readers observe either
//! the previous content or the new content and never a torn write.

use serde::{Serialize, de::DeserializeOwned};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use stratum_core::{Result, StratumError};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// A handle to a JSON file that is always replaced atomically.
///
/// Provides:
/// - **Atomicity**: Updates are all-or-nothing via tmp file + atomic rename
/// - **Durability**: Explicit fsync before rename
///
/// Every save uses its own temp file, so concurrent saves never interleave
/// bytes. Ordering read-modify-write cycles is the caller's concern; see
/// `FileMigrationClient`.
#[derive(Debug, Clone)]
pub struct AtomicJsonFile<T> {
    path: PathBuf,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> AtomicJsonFile<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _phantom: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads and deserializes the file.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(T))`: Successfully loaded and deserialized
    /// - `Ok(None)`: File doesn't exist or is empty
    /// - `Err`: Failed to read or parse the file
    pub async fn load(&self) -> Result<Option<T>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_context(e, "read", &self.path)),
        };

        if content.trim().is_empty() {
            return Ok(None);
        }

        let data = serde_json::from_str(&content).map_err(|e| StratumError::Serialization {
            format: "JSON".to_string(),
            message: format!("{}: {}", self.path.display(), e),
        })?;
        Ok(Some(data))
    }

    /// Serializes `data` and atomically replaces the file with it.
    pub async fn save(&self, data: &T) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| io_context(e, "create directory", parent))?;
        }

        let json = serde_json::to_vec_pretty(data)?;

        let tmp_path = self.temp_path()?;
        let written = Self::write_synced(&tmp_path, &json).await;
        let result = match written {
            Ok(()) => fs::rename(&tmp_path, &self.path)
                .await
                .map_err(|e| io_context(e, "rename", &tmp_path)),
            Err(e) => Err(e),
        };

        if result.is_err() {
            let _ = fs::remove_file(&tmp_path).await;
        }
        result
    }

    async fn write_synced(tmp_path: &Path, bytes: &[u8]) -> Result<()> {
        let mut tmp_file = fs::File::create(tmp_path)
            .await
            .map_err(|e| io_context(e, "create", tmp_path))?;
        tmp_file
            .write_all(bytes)
            .await
            .map_err(|e| io_context(e, "write", tmp_path))?;
        tmp_file
            .sync_all()
            .await
            .map_err(|e| io_context(e, "sync", tmp_path))
    }

    /// `.{file_name}.{uuid}.tmp` next to the target, so the rename never crosses
    /// filesystems and no two saves share a temp file.
    fn temp_path(&self) -> Result<PathBuf> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| StratumError::io(format!("Path has no parent directory: {}", self.path.display())))?;
        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| StratumError::io(format!("Path has no file name: {}", self.path.display())))?;

        Ok(parent.join(format!(
            ".{}.{}.tmp",
            file_name.to_string_lossy(),
            Uuid::new_v4().simple()
        )))
    }
}

/// Attaches the failed action and path to an I/O error, keeping transient kinds transient.
pub(crate) fn io_context(err: std::io::Error, action: &str, path: &Path) -> StratumError {
    let message = format!("Failed to {} '{}': {}", action, path.display(), err);
    match StratumError::from(err) {
        StratumError::Transient(_) => StratumError::transient(message),
        _ => StratumError::io(message),
    }
}
