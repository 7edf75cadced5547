use stratum_application::WorkspaceMigrationService;
use stratum_application::modules::setting::{DEPRECATED_SETTING_SPACE, SETTING_DOMAIN, SETTING_MODULE};
use stratum_core::document::SPACE_SPACE;
use stratum_core::{
    Document, Domain, Filter, HookFailurePolicy, MigrationClient, MigrationMode, ModuleId,
    SpaceRef, StratumError,
};
use stratum_infrastructure::{FileMigrationClient, WorkspaceLock};
use tempfile::TempDir;

fn service(temp_dir: &TempDir) -> WorkspaceMigrationService {
    WorkspaceMigrationService::with_builtin_modules(temp_dir.path(), HookFailurePolicy::Report)
        .unwrap()
}

#[tokio::test]
async fn test_upgrade_moves_legacy_settings() {
    let temp_dir = TempDir::new().unwrap();
    let service = service(&temp_dir);
    let dir = service.workspace_dir("ws-legacy").unwrap();

    // Legacy workspace data written by an older release
    {
        let client = FileMigrationClient::open(&dir).await.unwrap();
        let old = SpaceRef::new(DEPRECATED_SETTING_SPACE);
        client
            .insert(
                &Domain::space(),
                Document::new(DEPRECATED_SETTING_SPACE).with_class(SPACE_SPACE),
            )
            .await
            .unwrap();
        client
            .insert(&Domain::new(SETTING_DOMAIN), Document::new("theme").with_space(&old))
            .await
            .unwrap();
    }

    let report = service
        .migrate("ws-legacy", MigrationMode::Upgrade)
        .await
        .unwrap();
    assert!(report.is_clean());
    assert_eq!(report.modules_migrated, vec![ModuleId::new(SETTING_MODULE)]);

    let client = FileMigrationClient::open(&dir).await.unwrap();
    let theme = client
        .find_one(&Domain::new(SETTING_DOMAIN), &Filter::by_id("theme"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(theme.space(), Some(SpaceRef::workspace()));
    assert_eq!(client.count(&Domain::space(), &Filter::all()).await.unwrap(), 0);

    let states = service.status("ws-legacy").await.unwrap();
    assert!(states.is_completed(&ModuleId::new(SETTING_MODULE), "removeDeprecatedSpace"));
}

#[tokio::test]
async fn test_status_of_unknown_workspace() {
    let temp_dir = TempDir::new().unwrap();
    let err = service(&temp_dir).status("missing").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_status_of_workspace_path_that_is_a_file() {
    let temp_dir = TempDir::new().unwrap();
    let service = service(&temp_dir);
    let dir = service.workspace_dir("stray").unwrap();
    std::fs::create_dir_all(dir.parent().unwrap()).unwrap();
    std::fs::write(&dir, "not a workspace").unwrap();

    let err = service.status("stray").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_concurrent_upgrade_is_locked() {
    let temp_dir = TempDir::new().unwrap();
    let service = service(&temp_dir);
    let dir = service.workspace_dir("ws-busy").unwrap();

    let held = WorkspaceLock::acquire(&dir).unwrap();
    let err = service
        .migrate("ws-busy", MigrationMode::Upgrade)
        .await
        .unwrap_err();
    assert!(matches!(err, StratumError::Locked(_)));

    drop(held);
    assert!(service.migrate("ws-busy", MigrationMode::Upgrade).await.is_ok());
}

#[tokio::test]
async fn test_invalid_workspace_id() {
    let temp_dir = TempDir::new().unwrap();
    let err = service(&temp_dir)
        .migrate("../escape", MigrationMode::InitialCreate)
        .await
        .unwrap_err();
    assert!(matches!(err, StratumError::Config(_)));
}
