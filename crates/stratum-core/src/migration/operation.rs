//! Per-module migration operations.

use super::client::MigrationClient;
use super::mode::MigrationMode;
use super::runner::try_migrate;
use super::state::MigrationStates;
use super::step::MigrationRegistry;
use crate::document::ModuleId;
use crate::error::Result;
use async_trait::async_trait;

/// The migration entry points a module exposes to workspace bootstrap.
///
/// `migrate` performs structural, state-tracked migration (normally a single
/// [`try_migrate`] call over the module's step list). `upgrade` runs after every
/// module has migrated, on every upgrade cycle, and is not gated by migration
/// state; use it for work that must be redone each time (e.g. recomputing a
/// derived index).
#[async_trait]
pub trait MigrateOperation: Send + Sync {
    fn module_id(&self) -> ModuleId;

    async fn migrate(&self, client: &dyn MigrationClient, mode: MigrationMode) -> Result<()>;

    async fn upgrade(&self, _states: &MigrationStates, _client: &dyn MigrationClient) -> Result<()> {
        Ok(())
    }
}

/// A bare step registry is an operation without an upgrade hook.
#[async_trait]
impl MigrateOperation for MigrationRegistry {
    fn module_id(&self) -> ModuleId {
        self.module().clone()
    }

    async fn migrate(&self, client: &dyn MigrationClient, mode: MigrationMode) -> Result<()> {
        try_migrate(mode, client, self.module(), self.steps()).await?;
        Ok(())
    }
}
