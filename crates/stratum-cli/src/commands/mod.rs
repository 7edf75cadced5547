pub mod config;
pub mod logging;
pub mod migrate;
pub mod status;

use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use stratum_application::WorkspaceMigrationService;
use stratum_core::EngineConfig;
use stratum_infrastructure::{ConfigService, resolve_data_root};

/// Everything a command needs: effective config and where it came from.
pub struct Context {
    pub config_service: ConfigService,
    pub config: EngineConfig,
    pub data_root: PathBuf,
}

impl Context {
    pub async fn load(config_path: Option<&Path>, data_dir: Option<&Path>) -> Result<Self> {
        let config_service = match config_path {
            Some(path) => ConfigService::new(path)?,
            None => ConfigService::default_location()?,
        };
        let config = config_service
            .load()
            .await
            .with_context(|| format!("Failed to load config {}", config_service.path().display()))?;
        let data_root = resolve_data_root(&config, data_dir)?;

        Ok(Self {
            config_service,
            config,
            data_root,
        })
    }

    pub fn migration_service(&self) -> Result<WorkspaceMigrationService> {
        Ok(WorkspaceMigrationService::with_builtin_modules(
            &self.data_root,
            self.config.hook_failure_policy,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratum_core::HookFailurePolicy;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_context_prefers_data_dir_flag() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(
            &config_path,
            "version = \"1.1.0\"\ndata_dir = \"/from/config\"\nhook_failure_policy = \"abort\"\n",
        )
        .unwrap();
        let flag = temp_dir.path().join("data");

        let context = Context::load(Some(config_path.as_path()), Some(flag.as_path())).await.unwrap();

        assert_eq!(context.data_root, flag);
        assert_eq!(context.config.hook_failure_policy, HookFailurePolicy::Abort);
        assert_eq!(
            context.migration_service().unwrap().upgrader().hook_failure_policy(),
            HookFailurePolicy::Abort
        );
    }
}
