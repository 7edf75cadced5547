//! Built-in migration modules.

pub mod setting;

use std::sync::Arc;
use stratum_core::MigrateOperation;

pub use setting::SettingMigration;

/// Module operations every workspace runs, in bootstrap order.
pub fn builtin_modules() -> Vec<Arc<dyn MigrateOperation>> {
    vec![Arc::new(SettingMigration::new())]
}
