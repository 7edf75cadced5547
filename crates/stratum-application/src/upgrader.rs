//! Workspace upgrader.
//!
//! Composes the per-module migration operations into the bootstrap sequence of
//! one workspace: every module's structural migration in registration order,
//! then every module's upgrade hook against a snapshot of the resulting state.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use stratum_core::{
    HookFailurePolicy, MigrateOperation, MigrationClient, MigrationMode, MigrationStates,
    ModuleId, Result, StratumError,
};

/// An upgrade hook that failed under [`HookFailurePolicy::Report`].
#[derive(Debug, Clone)]
pub struct HookFailure {
    pub module: ModuleId,
    pub error: StratumError,
}

/// Summary of one upgrader run.
#[derive(Debug, Clone)]
pub struct UpgradeReport {
    pub mode: MigrationMode,
    /// Modules whose structural migration completed, in run order
    pub modules_migrated: Vec<ModuleId>,
    pub hook_failures: Vec<HookFailure>,
    pub elapsed: Duration,
}

impl UpgradeReport {
    /// True when every hook succeeded.
    pub fn is_clean(&self) -> bool {
        self.hook_failures.is_empty()
    }
}

/// Ordered set of module operations run against one workspace at a time.
///
/// There is no global registry: callers assemble the module list explicitly,
/// usually starting from [`crate::modules::builtin_modules`].
#[derive(Clone, Default)]
pub struct WorkspaceUpgrader {
    operations: Vec<Arc<dyn MigrateOperation>>,
    hook_failure_policy: HookFailurePolicy,
}

impl WorkspaceUpgrader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an upgrader over `operations`, in the given order.
    pub fn with_modules(
        operations: impl IntoIterator<Item = Arc<dyn MigrateOperation>>,
    ) -> Result<Self> {
        operations
            .into_iter()
            .try_fold(Self::new(), |upgrader, operation| upgrader.register(operation))
    }

    pub fn with_hook_failure_policy(mut self, policy: HookFailurePolicy) -> Self {
        self.hook_failure_policy = policy;
        self
    }

    /// Appends a module operation.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateModule` if an operation for the same module is already registered.
    pub fn register(mut self, operation: Arc<dyn MigrateOperation>) -> Result<Self> {
        let module = operation.module_id();
        if self.operations.iter().any(|op| op.module_id() == module) {
            return Err(StratumError::DuplicateModule(module.to_string()));
        }
        self.operations.push(operation);
        Ok(self)
    }

    pub fn hook_failure_policy(&self) -> HookFailurePolicy {
        self.hook_failure_policy
    }

    pub fn module_ids(&self) -> Vec<ModuleId> {
        self.operations.iter().map(|op| op.module_id()).collect()
    }

    /// Runs the full upgrade sequence against one workspace.
    ///
    /// # Errors
    ///
    /// - `ModuleFailed` wrapping the first module migration error; later modules
    ///   and all hooks are skipped
    /// - `HookFailed` for the first failing hook under [`HookFailurePolicy::Abort`]
    /// - any error while reading the state snapshot between the two phases
    pub async fn run(&self, mode: MigrationMode, client: &dyn MigrationClient) -> Result<UpgradeReport> {
        let started = Instant::now();
        let mut modules_migrated = Vec::with_capacity(self.operations.len());

        tracing::info!(
            mode = %mode,
            "Upgrading workspace: {} modules",
            self.operations.len()
        );

        for operation in &self.operations {
            let module = operation.module_id();
            if let Err(e) = operation.migrate(client, mode).await {
                tracing::error!(module = %module, "Module migration failed: {}", e);
                return Err(StratumError::module_failed(module.as_str(), e));
            }
            modules_migrated.push(module);
        }

        let states = self.states(client).await?;

        let mut hook_failures = Vec::new();
        for operation in &self.operations {
            let module = operation.module_id();
            if let Err(e) = operation.upgrade(&states, client).await {
                match self.hook_failure_policy {
                    HookFailurePolicy::Abort => {
                        tracing::error!(module = %module, "Upgrade hook failed: {}", e);
                        return Err(StratumError::hook_failed(module.as_str(), e));
                    }
                    HookFailurePolicy::Report => {
                        tracing::warn!(module = %module, "Upgrade hook failed, continuing: {}", e);
                        hook_failures.push(HookFailure { module, error: e });
                    }
                }
            }
        }

        let report = UpgradeReport {
            mode,
            modules_migrated,
            hook_failures,
            elapsed: started.elapsed(),
        };

        tracing::info!(
            mode = %mode,
            "Workspace upgraded in {:?}: {} modules, {} hook failures",
            report.elapsed,
            report.modules_migrated.len(),
            report.hook_failures.len()
        );

        Ok(report)
    }

    /// Reads the completed-set of every registered module.
    pub async fn states(&self, client: &dyn MigrationClient) -> Result<MigrationStates> {
        let mut states = MigrationStates::new();
        for operation in &self.operations {
            let module = operation.module_id();
            let completed = client.get_migration_state(&module).await?;
            states.insert(module, completed);
        }
        Ok(states)
    }
}

impl fmt::Debug for WorkspaceUpgrader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkspaceUpgrader")
            .field("modules", &self.module_ids())
            .field("hook_failure_policy", &self.hook_failure_policy)
            .finish()
    }
}
