//! Storage backends and configuration for the stratum migration engine.

mod collection;
pub mod config_service;
pub mod dto;
pub mod file_client;
pub mod memory_client;
pub mod paths;
pub mod storage;

pub use config_service::{ConfigService, DATA_DIR_ENV, apply_overrides, resolve_data_root};
pub use file_client::FileMigrationClient;
pub use memory_client::InMemoryMigrationClient;
pub use paths::StratumPaths;
pub use storage::{AtomicJsonFile, WorkspaceLock};
