//! Built-in `setting` module.
//!
//! Settings used to live in a dedicated `setting:space:Setting` container.
//! They now belong to the workspace container, and the old one is removed.

use async_trait::async_trait;
use std::sync::Arc;
use stratum_core::{
    Domain, MigrateOperation, MigrationClient, MigrationMode, MigrationRegistry, MigrationStep,
    ModuleId, Result, SpaceRef, migrate_space, try_migrate,
};

pub const SETTING_MODULE: &str = "setting";
pub const SETTING_DOMAIN: &str = "setting";
/// Container settings were kept in before they moved to the workspace space.
pub const DEPRECATED_SETTING_SPACE: &str = "setting:space:Setting";

/// Moves every setting out of the deprecated container and drops it.
#[derive(Debug, Default)]
pub struct RemoveDeprecatedSpace;

#[async_trait]
impl MigrationStep for RemoveDeprecatedSpace {
    fn name(&self) -> &str {
        "removeDeprecatedSpace"
    }

    async fn apply(&self, client: &dyn MigrationClient) -> Result<()> {
        let report = migrate_space(
            client,
            &SpaceRef::new(DEPRECATED_SETTING_SPACE),
            &SpaceRef::workspace(),
            &[Domain::new(SETTING_DOMAIN)],
        )
        .await?;

        tracing::debug!(
            "Moved {} settings out of {}",
            report.total_moved(),
            DEPRECATED_SETTING_SPACE
        );
        Ok(())
    }
}

/// Migration operation of the `setting` module.
#[derive(Debug)]
pub struct SettingMigration {
    registry: MigrationRegistry,
}

impl SettingMigration {
    pub fn new() -> Self {
        let mut registry = MigrationRegistry::new(ModuleId::new(SETTING_MODULE));
        registry.register(Arc::new(RemoveDeprecatedSpace));
        Self { registry }
    }

    pub fn steps(&self) -> &[Arc<dyn MigrationStep>] {
        self.registry.steps()
    }
}

impl Default for SettingMigration {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MigrateOperation for SettingMigration {
    fn module_id(&self) -> ModuleId {
        self.registry.module().clone()
    }

    async fn migrate(&self, client: &dyn MigrationClient, mode: MigrationMode) -> Result<()> {
        let outcome = try_migrate(mode, client, self.registry.module(), self.registry.steps()).await?;
        if !outcome.is_noop() {
            tracing::info!(
                module = SETTING_MODULE,
                "Applied {} setting migrations",
                outcome.applied.len()
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratum_core::document::SPACE_SPACE;
    use stratum_core::{Document, Filter};
    use stratum_infrastructure::InMemoryMigrationClient;

    fn settings() -> Domain {
        Domain::new(SETTING_DOMAIN)
    }

    #[tokio::test]
    async fn test_moves_settings_to_workspace_space() {
        let old = SpaceRef::new(DEPRECATED_SETTING_SPACE);
        let client = InMemoryMigrationClient::with_documents([
            (
                Domain::space(),
                Document::new(DEPRECATED_SETTING_SPACE).with_class(SPACE_SPACE),
            ),
            (settings(), Document::new("theme").with_space(&old)),
            (settings(), Document::new("locale").with_space(&old)),
        ]);

        SettingMigration::new()
            .migrate(&client, MigrationMode::Upgrade)
            .await
            .unwrap();

        assert_eq!(
            client
                .count(&settings(), &Filter::in_space(&SpaceRef::workspace()))
                .await
                .unwrap(),
            2
        );
        assert!(client.documents(&Domain::space()).await.is_empty());
        let completed = client
            .get_migration_state(&ModuleId::new(SETTING_MODULE))
            .await
            .unwrap();
        assert!(completed.contains("removeDeprecatedSpace"));
    }

    #[tokio::test]
    async fn test_fresh_workspace_records_step() {
        let client = InMemoryMigrationClient::new();

        SettingMigration::new()
            .migrate(&client, MigrationMode::InitialCreate)
            .await
            .unwrap();

        let completed = client
            .get_migration_state(&ModuleId::new(SETTING_MODULE))
            .await
            .unwrap();
        assert_eq!(completed.len(), 1);
    }
}
