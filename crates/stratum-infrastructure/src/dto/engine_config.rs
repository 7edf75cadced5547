//! EngineConfig DTOs and migrations

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use version_migrate::{FromDomain, IntoDomain, MigratesTo, Versioned};

use stratum_core::{EngineConfig, HookFailurePolicy, LogFormat, Result};

fn default_log_level() -> String {
    "info".to_string()
}

/// Engine configuration V1.0.0 (initial version).
#[derive(Debug, Clone, Serialize, Deserialize, Versioned)]
#[versioned(version = "1.0.0")]
pub struct EngineConfigV1_0_0 {
    /// Root directory for workspace data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Engine configuration V1.1.0 (added hook failure policy and log format).
#[derive(Debug, Clone, Serialize, Deserialize, Versioned)]
#[versioned(version = "1.1.0")]
pub struct EngineConfigV1_1_0 {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// `report` (default) or `abort`.
    #[serde(default)]
    pub hook_failure_policy: HookFailurePolicy,

    /// `text` (default) or `json`.
    #[serde(default)]
    pub log_format: LogFormat,
}

/// Type alias for the latest EngineConfig version.
pub type EngineConfigDTO = EngineConfigV1_1_0;

// ============================================================================
// Migration implementations
// ============================================================================

/// Migration from V1.0.0 to V1.1.0: new fields take their defaults.
impl MigratesTo<EngineConfigV1_1_0> for EngineConfigV1_0_0 {
    fn migrate(self) -> EngineConfigV1_1_0 {
        EngineConfigV1_1_0 {
            data_dir: self.data_dir,
            log_level: self.log_level,
            hook_failure_policy: HookFailurePolicy::default(),
            log_format: LogFormat::default(),
        }
    }
}

// ============================================================================
// Domain model conversions
// ============================================================================

impl IntoDomain<EngineConfig> for EngineConfigV1_1_0 {
    fn into_domain(self) -> EngineConfig {
        EngineConfig {
            data_dir: self.data_dir,
            log_level: self.log_level,
            hook_failure_policy: self.hook_failure_policy,
            log_format: self.log_format,
        }
    }
}

impl FromDomain<EngineConfig> for EngineConfigV1_1_0 {
    fn from_domain(config: EngineConfig) -> Self {
        EngineConfigV1_1_0 {
            data_dir: config.data_dir,
            log_level: config.log_level,
            hook_failure_policy: config.hook_failure_policy,
            log_format: config.log_format,
        }
    }
}

// ============================================================================
// Migrator factory
// ============================================================================

/// Entity name the config is registered under.
pub const ENGINE_CONFIG_ENTITY: &str = "engine_config";

/// Creates a Migrator for EngineConfig.
///
/// # Migration Path
///
/// - V1.0.0 → V1.1.0: Adds `hook_failure_policy` and `log_format` with defaults
/// - V1.1.0 → EngineConfig: Converts DTO to domain model
pub fn create_engine_config_migrator() -> Result<version_migrate::Migrator> {
    let mut migrator = version_migrate::Migrator::builder().build();

    let config_path = version_migrate::Migrator::define(ENGINE_CONFIG_ENTITY)
        .from::<EngineConfigV1_0_0>()
        .step::<EngineConfigV1_1_0>()
        .into_with_save::<EngineConfig>();

    migrator.register(config_path)?;

    Ok(migrator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_config_migration_v1_0_to_domain() {
        let migrator = create_engine_config_migrator().unwrap();

        let toml_str = r#"
version = "1.0.0"
data_dir = "/srv/stratum"
log_level = "debug"
"#;
        let toml_value: toml::Value = toml::from_str(toml_str).unwrap();

        let result: std::result::Result<EngineConfig, _> =
            migrator.load_flat_from(ENGINE_CONFIG_ENTITY, toml_value);

        assert!(result.is_ok(), "Migration failed: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.data_dir, Some(PathBuf::from("/srv/stratum")));
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.hook_failure_policy, HookFailurePolicy::Report);
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn test_engine_config_v1_1_loads_directly() {
        let migrator = create_engine_config_migrator().unwrap();

        let toml_str = r#"
version = "1.1.0"
log_level = "warn"
hook_failure_policy = "abort"
log_format = "json"
"#;
        let toml_value: toml::Value = toml::from_str(toml_str).unwrap();

        let config: EngineConfig = migrator
            .load_flat_from(ENGINE_CONFIG_ENTITY, toml_value)
            .unwrap();
        assert_eq!(config.data_dir, None);
        assert_eq!(config.hook_failure_policy, HookFailurePolicy::Abort);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_engine_config_save_writes_latest_version() {
        let migrator = create_engine_config_migrator().unwrap();

        let json_str = migrator
            .save_domain_flat(ENGINE_CONFIG_ENTITY, EngineConfig::default())
            .unwrap();

        assert!(json_str.contains("\"version\":\"1.1.0\""));
        assert!(json_str.contains("\"hook_failure_policy\":\"report\""));
    }
}
