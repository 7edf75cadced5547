//! Application layer for stratum.
//!
//! Composes module migrations into workspace upgrades and binds them to the
//! file store used by the CLI.

pub mod modules;
pub mod upgrader;
pub mod workspace_service;

pub use modules::{SettingMigration, builtin_modules};
pub use stratum_core::HookFailurePolicy;
pub use upgrader::{HookFailure, UpgradeReport, WorkspaceUpgrader};
pub use workspace_service::WorkspaceMigrationService;
