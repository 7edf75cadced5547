//! Unified path management for stratum.
//!
//! Platform directories come from `AppPaths` (version-migrate), the same
//! resolver the versioned config loader uses.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/stratum/           # Config directory (AppPaths default)
//! └── config.toml              # EngineConfig (versioned)
//!
//! ~/.local/share/stratum/      # Data directory (overridable)
//! └── workspaces/
//!     └── <workspace-id>/      # One FileMigrationClient root per workspace
//! ```

use std::path::{Path, PathBuf};
use stratum_core::{Result, StratumError};
use version_migrate::AppPaths;

const APP_NAME: &str = "stratum";

pub struct StratumPaths;

impl StratumPaths {
    fn app_paths() -> AppPaths {
        AppPaths::new(APP_NAME)
    }

    /// Platform config directory, e.g. `~/.config/stratum/`.
    pub fn config_dir() -> Result<PathBuf> {
        Self::app_paths()
            .config_dir()
            .map_err(|_| StratumError::config("Cannot determine config directory"))
    }

    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Platform data directory, e.g. `~/.local/share/stratum/`.
    pub fn data_dir() -> Result<PathBuf> {
        Self::app_paths()
            .data_dir()
            .map_err(|_| StratumError::config("Cannot determine data directory"))
    }

    /// Directory holding one subdirectory per workspace under `data_root`.
    pub fn workspaces_dir(data_root: &Path) -> PathBuf {
        data_root.join("workspaces")
    }

    /// Directory of a single workspace.
    ///
    /// # Errors
    ///
    /// Workspace ids become directory names, so anything outside
    /// `[A-Za-z0-9_.-]+` (or `.`/`..`) is rejected as a config error.
    pub fn workspace_dir(data_root: &Path, workspace_id: &str) -> Result<PathBuf> {
        let valid = !workspace_id.is_empty()
            && workspace_id != "."
            && workspace_id != ".."
            && workspace_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
        if !valid {
            return Err(StratumError::config(format!(
                "Invalid workspace id '{}'",
                workspace_id
            )));
        }
        Ok(Self::workspaces_dir(data_root).join(workspace_id))
    }

    /// Expands a leading `~/` to the user's home directory.
    pub fn expand_home(path: &Path) -> PathBuf {
        match path.strip_prefix("~") {
            Ok(rest) => match dirs::home_dir() {
                Some(home) => home.join(rest),
                None => path.to_path_buf(),
            },
            Err(_) => path.to_path_buf(),
        }
    }
}
