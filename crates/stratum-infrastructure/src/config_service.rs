//! Configuration service.
//!
//! Loads the versioned `config.toml` (default `~/.config/stratum/config.toml`),
//! migrating older schema versions forward, and applies environment overrides.

use crate::dto::{ENGINE_CONFIG_ENTITY, create_engine_config_migrator};
use crate::paths::StratumPaths;
use std::path::{Path, PathBuf};
use stratum_core::{EngineConfig, Result, StratumError};

/// Environment variable overriding `data_dir`.
pub const DATA_DIR_ENV: &str = "STRATUM_DATA_DIR";

/// Version assumed for config files written before the `version` key existed.
const UNVERSIONED_CONFIG_VERSION: &str = "1.0.0";

/// Loads and renders the engine configuration file.
pub struct ConfigService {
    path: PathBuf,
    migrator: version_migrate::Migrator,
}

impl ConfigService {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            path: path.into(),
            migrator: create_engine_config_migrator()?,
        })
    }

    /// Service bound to the platform config file.
    pub fn default_location() -> Result<Self> {
        Self::new(StratumPaths::config_file()?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the effective configuration.
    ///
    /// A missing or empty file yields defaults; `STRATUM_DATA_DIR` overrides
    /// `data_dir` either way.
    pub async fn load(&self) -> Result<EngineConfig> {
        let config = self.load_file().await?;
        Ok(apply_overrides(config, |key| std::env::var(key).ok()))
    }

    /// Loads the file alone, without environment overrides.
    pub async fn load_file(&self) -> Result<EngineConfig> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No config file at {}, using defaults", self.path.display());
                return Ok(EngineConfig::default());
            }
            Err(e) => {
                return Err(StratumError::io(format!(
                    "Failed to read config file '{}': {}",
                    self.path.display(),
                    e
                )));
            }
        };

        if content.trim().is_empty() {
            return Ok(EngineConfig::default());
        }

        self.parse(&content)
    }

    /// Parses TOML content of any known schema version into the latest model.
    pub fn parse(&self, content: &str) -> Result<EngineConfig> {
        let mut toml_value: toml::Value = toml::from_str(content).map_err(|e| {
            StratumError::Serialization {
                format: "TOML".to_string(),
                message: format!("Failed to parse config '{}': {}", self.path.display(), e),
            }
        })?;

        if let toml::Value::Table(table) = &mut toml_value {
            table
                .entry("version")
                .or_insert_with(|| toml::Value::String(UNVERSIONED_CONFIG_VERSION.to_string()));
        }

        self.migrator
            .load_flat_from(ENGINE_CONFIG_ENTITY, toml_value)
            .map_err(|e| {
                StratumError::config(format!(
                    "Failed to migrate config '{}': {}",
                    self.path.display(),
                    e
                ))
            })
    }

    /// Renders `config` as TOML in the latest schema version.
    pub fn render(&self, config: &EngineConfig) -> Result<String> {
        let json_str = self
            .migrator
            .save_domain_flat(ENGINE_CONFIG_ENTITY, config.clone())?;

        let mut json_value: serde_json::Value = serde_json::from_str(&json_str)?;
        // TOML has no null
        if let serde_json::Value::Object(map) = &mut json_value {
            map.retain(|_, value| !value.is_null());
        }

        let toml_value = toml::Value::try_from(json_value)?;
        Ok(toml::to_string_pretty(&toml_value)?)
    }
}

/// Applies environment overrides, reading variables through `lookup`.
pub fn apply_overrides<F>(mut config: EngineConfig, lookup: F) -> EngineConfig
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(data_dir) = lookup(DATA_DIR_ENV).filter(|value| !value.trim().is_empty()) {
        tracing::debug!("{} overrides data_dir: {}", DATA_DIR_ENV, data_dir);
        config.data_dir = Some(PathBuf::from(data_dir));
    }
    config
}

/// Resolves the data root: explicit override, then config, then the platform default.
pub fn resolve_data_root(config: &EngineConfig, explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit.or(config.data_dir.as_deref()) {
        Some(dir) => Ok(StratumPaths::expand_home(dir)),
        None => StratumPaths::data_dir(),
    }
}
