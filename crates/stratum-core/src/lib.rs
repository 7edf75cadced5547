pub mod config;
pub mod document;
pub mod error;
pub mod migration;

// Re-export common error type
pub use error::{Result, StratumError};

pub use config::{EngineConfig, HookFailurePolicy, LogFormat};
pub use document::{DocId, Document, Domain, Filter, ModuleId, Patch, SpaceRef};
pub use migration::{
    CompletedSet, FnStep, MigrateOperation, MigrationClient, MigrationMode, MigrationOutcome,
    MigrationRegistry, MigrationStates, MigrationStep, SpaceMoveReport, StepPolicy,
    migrate_space, try_migrate,
};
