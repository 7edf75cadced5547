use async_trait::async_trait;
use futures::FutureExt;
use std::sync::{Arc, Mutex};
use stratum_application::{HookFailurePolicy, WorkspaceUpgrader};
use stratum_core::{
    FnStep, MigrateOperation, MigrationClient, MigrationMode, MigrationRegistry, MigrationStates,
    ModuleId, Result, StratumError,
};
use stratum_infrastructure::InMemoryMigrationClient;

type Log = Arc<Mutex<Vec<String>>>;

/// Module that logs every call and fails where told to.
struct ScriptedModule {
    id: &'static str,
    log: Log,
    fail_migrate: bool,
    fail_hook: bool,
    /// States seen by the hook
    seen: Arc<Mutex<Option<MigrationStates>>>,
}

impl ScriptedModule {
    fn new(id: &'static str, log: Log) -> Self {
        Self {
            id,
            log,
            fail_migrate: false,
            fail_hook: false,
            seen: Arc::default(),
        }
    }

    fn failing_migrate(mut self) -> Self {
        self.fail_migrate = true;
        self
    }

    fn failing_hook(mut self) -> Self {
        self.fail_hook = true;
        self
    }
}

#[async_trait]
impl MigrateOperation for ScriptedModule {
    fn module_id(&self) -> ModuleId {
        ModuleId::new(self.id)
    }

    async fn migrate(&self, client: &dyn MigrationClient, _mode: MigrationMode) -> Result<()> {
        self.log.lock().unwrap().push(format!("migrate:{}", self.id));
        if self.fail_migrate {
            return Err(StratumError::transient("store offline"));
        }
        let completed = ["init"].into_iter().collect();
        client.set_migration_state(&self.module_id(), &completed).await
    }

    async fn upgrade(&self, states: &MigrationStates, _client: &dyn MigrationClient) -> Result<()> {
        self.log.lock().unwrap().push(format!("upgrade:{}", self.id));
        *self.seen.lock().unwrap() = Some(states.clone());
        if self.fail_hook {
            return Err(StratumError::internal("index rebuild failed"));
        }
        Ok(())
    }
}

fn upgrader(modules: Vec<ScriptedModule>) -> WorkspaceUpgrader {
    WorkspaceUpgrader::with_modules(
        modules
            .into_iter()
            .map(|m| Arc::new(m) as Arc<dyn MigrateOperation>),
    )
    .unwrap()
}

#[tokio::test]
async fn test_migrates_all_then_runs_hooks_in_order() {
    let log: Log = Arc::default();
    let upgrader = upgrader(vec![
        ScriptedModule::new("core", log.clone()),
        ScriptedModule::new("tracker", log.clone()),
    ]);
    let client = InMemoryMigrationClient::new();

    let report = upgrader.run(MigrationMode::Upgrade, &client).await.unwrap();

    assert!(report.is_clean());
    assert_eq!(
        report.modules_migrated,
        vec![ModuleId::new("core"), ModuleId::new("tracker")]
    );
    assert_eq!(
        *log.lock().unwrap(),
        vec!["migrate:core", "migrate:tracker", "upgrade:core", "upgrade:tracker"]
    );
}

#[tokio::test]
async fn test_hooks_see_state_of_every_module() {
    let log: Log = Arc::default();
    let first = ScriptedModule::new("core", log.clone());
    let seen = first.seen.clone();
    let upgrader = upgrader(vec![first, ScriptedModule::new("tracker", log.clone())]);

    upgrader
        .run(MigrationMode::Upgrade, &InMemoryMigrationClient::new())
        .await
        .unwrap();

    let states = seen.lock().unwrap().clone().unwrap();
    assert!(states.is_completed(&ModuleId::new("core"), "init"));
    assert!(states.is_completed(&ModuleId::new("tracker"), "init"));
}

#[tokio::test]
async fn test_module_failure_aborts_upgrade() {
    let log: Log = Arc::default();
    let upgrader = upgrader(vec![
        ScriptedModule::new("core", log.clone()),
        ScriptedModule::new("tracker", log.clone()).failing_migrate(),
        ScriptedModule::new("chunter", log.clone()),
    ]);

    let err = upgrader
        .run(MigrationMode::Upgrade, &InMemoryMigrationClient::new())
        .await
        .unwrap_err();

    match &err {
        StratumError::ModuleFailed { module, .. } => assert_eq!(module, "tracker"),
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(err.is_transient());
    assert_eq!(*log.lock().unwrap(), vec!["migrate:core", "migrate:tracker"]);
}

#[tokio::test]
async fn test_hook_failure_reported_by_default() {
    let log: Log = Arc::default();
    let upgrader = upgrader(vec![
        ScriptedModule::new("core", log.clone()).failing_hook(),
        ScriptedModule::new("tracker", log.clone()),
    ]);
    assert_eq!(upgrader.hook_failure_policy(), HookFailurePolicy::Report);

    let report = upgrader
        .run(MigrationMode::Upgrade, &InMemoryMigrationClient::new())
        .await
        .unwrap();

    assert!(!report.is_clean());
    assert_eq!(report.hook_failures.len(), 1);
    assert_eq!(report.hook_failures[0].module, ModuleId::new("core"));
    // The remaining hook still ran
    assert!(log.lock().unwrap().contains(&"upgrade:tracker".to_string()));
}

#[tokio::test]
async fn test_hook_failure_aborts_under_abort_policy() {
    let log: Log = Arc::default();
    let upgrader = upgrader(vec![
        ScriptedModule::new("core", log.clone()).failing_hook(),
        ScriptedModule::new("tracker", log.clone()),
    ])
    .with_hook_failure_policy(HookFailurePolicy::Abort);

    let err = upgrader
        .run(MigrationMode::Upgrade, &InMemoryMigrationClient::new())
        .await
        .unwrap_err();

    assert!(matches!(err, StratumError::HookFailed { .. }));
    assert!(!log.lock().unwrap().contains(&"upgrade:tracker".to_string()));
}

#[tokio::test]
async fn test_duplicate_module_rejected() {
    let log: Log = Arc::default();
    let result = WorkspaceUpgrader::new()
        .register(Arc::new(ScriptedModule::new("core", log.clone())))
        .and_then(|u| u.register(Arc::new(ScriptedModule::new("core", log.clone()))));

    assert!(matches!(result, Err(StratumError::DuplicateModule(m)) if m == "core"));
}

#[tokio::test]
async fn test_registry_runs_as_module() {
    let count = Arc::new(Mutex::new(0));
    let mut registry = MigrationRegistry::new(ModuleId::new("tracker"));
    let counter = count.clone();
    registry.register(
        FnStep::new("bumpCounter", move |_client| {
            let counter = counter.clone();
            async move {
                *counter.lock().unwrap() += 1;
                Ok(())
            }
            .boxed()
        })
        .into_arc(),
    );
    let upgrader = WorkspaceUpgrader::new().register(Arc::new(registry)).unwrap();
    let client = InMemoryMigrationClient::new();

    upgrader.run(MigrationMode::Upgrade, &client).await.unwrap();
    upgrader.run(MigrationMode::Upgrade, &client).await.unwrap();

    assert_eq!(*count.lock().unwrap(), 1);
}
