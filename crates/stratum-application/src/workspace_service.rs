//! Workspace migration use case.
//!
//! Binds the upgrader to the file store: one workspace directory per workspace
//! id under the data root, guarded by the per-workspace upgrade lock.

use crate::modules::builtin_modules;
use crate::upgrader::{UpgradeReport, WorkspaceUpgrader};
use std::path::{Path, PathBuf};
use stratum_core::{HookFailurePolicy, MigrationMode, MigrationStates, Result, StratumError};
use stratum_infrastructure::{FileMigrationClient, StratumPaths, WorkspaceLock};

/// Runs upgrades and reads migration status for workspaces under one data root.
#[derive(Debug, Clone)]
pub struct WorkspaceMigrationService {
    data_root: PathBuf,
    upgrader: WorkspaceUpgrader,
}

impl WorkspaceMigrationService {
    pub fn new(data_root: impl Into<PathBuf>, upgrader: WorkspaceUpgrader) -> Self {
        Self {
            data_root: data_root.into(),
            upgrader,
        }
    }

    /// Service running the built-in modules.
    pub fn with_builtin_modules(
        data_root: impl Into<PathBuf>,
        hook_failure_policy: HookFailurePolicy,
    ) -> Result<Self> {
        let upgrader = WorkspaceUpgrader::with_modules(builtin_modules())?
            .with_hook_failure_policy(hook_failure_policy);
        Ok(Self::new(data_root, upgrader))
    }

    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    pub fn upgrader(&self) -> &WorkspaceUpgrader {
        &self.upgrader
    }

    pub fn workspace_dir(&self, workspace_id: &str) -> Result<PathBuf> {
        StratumPaths::workspace_dir(&self.data_root, workspace_id)
    }

    /// Upgrades one workspace, creating its directory on first use.
    ///
    /// # Errors
    ///
    /// `Locked` if another upgrade of the same workspace is running, otherwise
    /// whatever [`WorkspaceUpgrader::run`] returns.
    pub async fn migrate(&self, workspace_id: &str, mode: MigrationMode) -> Result<UpgradeReport> {
        let dir = self.workspace_dir(workspace_id)?;
        let _lock = WorkspaceLock::acquire(&dir)?;
        let client = FileMigrationClient::open(&dir).await?;

        tracing::info!(
            workspace = workspace_id,
            mode = %mode,
            "Migrating workspace at {}",
            dir.display()
        );
        self.upgrader.run(mode, &client).await
    }

    /// Completed steps of every registered module for an existing workspace.
    pub async fn status(&self, workspace_id: &str) -> Result<MigrationStates> {
        let dir = self.workspace_dir(workspace_id)?;
        let is_dir = match tokio::fs::metadata(&dir).await {
            Ok(metadata) => metadata.is_dir(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => return Err(e.into()),
        };
        if !is_dir {
            return Err(StratumError::not_found("workspace", workspace_id));
        }
        let client = FileMigrationClient::open(&dir).await?;
        self.upgrader.states(&client).await
    }
}
