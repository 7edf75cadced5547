//! Data Transfer Objects (DTOs) for persistence.
//!
//! These DTOs represent the versioned schema of files the engine owns outside
//! workspace data. Workspace documents themselves are shape-free and are
//! migrated by migration steps, not by DTOs.
//!
//! ### EngineConfig Version History
//! - **1.0.0**: `data_dir`, `log_level`
//! - **1.1.0**: Added `hook_failure_policy` and `log_format`

mod engine_config;

pub use engine_config::{
    ENGINE_CONFIG_ENTITY, EngineConfigDTO, EngineConfigV1_0_0, EngineConfigV1_1_0,
    create_engine_config_migrator,
};
