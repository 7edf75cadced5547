//! Migration steps and per-module step registries.

use super::client::MigrationClient;
use super::mode::{MigrationMode, StepPolicy};
use crate::document::ModuleId;
use crate::error::{Result, StratumError};
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// One named, ordered data transformation.
///
/// The name is the key into persisted state: once shipped it must never be
/// renamed, or the step will look new and run again. `apply` may run more than
/// once (a crash between apply and recording completion re-runs it), so it must
/// be idempotent or no-op when its target state is already reached.
#[async_trait]
pub trait MigrationStep: Send + Sync {
    fn name(&self) -> &str;

    fn policy(&self) -> StepPolicy {
        StepPolicy::Once
    }

    async fn apply(&self, client: &dyn MigrationClient) -> Result<()>;
}

type ApplyFn =
    Box<dyn for<'a> Fn(&'a dyn MigrationClient) -> BoxFuture<'a, Result<()>> + Send + Sync>;

/// A step backed by a closure.
///
/// # Example
///
/// ```ignore
/// let step = FnStep::new("removeDeprecatedSpace", |client| {
///     async move {
///         migrate_space(client, &old, &SpaceRef::workspace(), &[Domain::new("setting")]).await?;
///         Ok(())
///     }
///     .boxed()
/// });
/// ```
pub struct FnStep {
    name: String,
    policy: StepPolicy,
    apply: ApplyFn,
}

impl FnStep {
    pub fn new<F>(name: impl Into<String>, apply: F) -> Self
    where
        F: for<'a> Fn(&'a dyn MigrationClient) -> BoxFuture<'a, Result<()>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            policy: StepPolicy::Once,
            apply: Box::new(apply),
        }
    }

    pub fn with_policy(mut self, policy: StepPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Skip on brand-new workspaces (recorded as completed without running).
    pub fn upgrade_only(self) -> Self {
        self.with_policy(StepPolicy::UpgradeOnly)
    }

    /// Re-run on every invocation in `mode`.
    pub fn always_in(self, mode: MigrationMode) -> Self {
        self.with_policy(StepPolicy::Always(mode))
    }

    pub fn into_arc(self) -> Arc<dyn MigrationStep> {
        Arc::new(self)
    }
}

impl fmt::Debug for FnStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnStep")
            .field("name", &self.name)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl MigrationStep for FnStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn policy(&self) -> StepPolicy {
        self.policy
    }

    async fn apply(&self, client: &dyn MigrationClient) -> Result<()> {
        (self.apply)(client).await
    }
}

/// Rejects step lists in which two steps share a name.
pub fn ensure_unique_names(module: &ModuleId, steps: &[Arc<dyn MigrationStep>]) -> Result<()> {
    let mut seen = HashSet::new();
    for step in steps {
        if !seen.insert(step.name()) {
            return Err(StratumError::DuplicateStep {
                module: module.to_string(),
                step: step.name().to_string(),
            });
        }
    }
    Ok(())
}

/// Ordered step list of one module.
///
/// Order is significant and must match historical registration order: new
/// steps are only ever appended.
///
/// # Example
///
/// ```ignore
/// let mut registry = MigrationRegistry::new(ModuleId::new("tracker"));
/// registry.register(FnStep::new("s1", ...).into_arc());
/// registry.register(FnStep::new("s2", ...).into_arc());
/// ```
pub struct MigrationRegistry {
    module: ModuleId,
    steps: Vec<Arc<dyn MigrationStep>>,
}

impl MigrationRegistry {
    pub fn new(module: ModuleId) -> Self {
        Self {
            module,
            steps: Vec::new(),
        }
    }

    /// Appends a step.
    ///
    /// # Panics
    ///
    /// Panics if a step with the same name is already registered. Registries are
    /// static, so this is a programming error caught at startup.
    pub fn register(&mut self, step: Arc<dyn MigrationStep>) -> &mut Self {
        assert!(
            !self.steps.iter().any(|s| s.name() == step.name()),
            "Duplicate migration step '{}' in module '{}'",
            step.name(),
            self.module
        );
        self.steps.push(step);
        self
    }

    pub fn register_all(&mut self, steps: impl IntoIterator<Item = Arc<dyn MigrationStep>>) -> &mut Self {
        for step in steps {
            self.register(step);
        }
        self
    }

    pub fn module(&self) -> &ModuleId {
        &self.module
    }

    pub fn steps(&self) -> &[Arc<dyn MigrationStep>] {
        &self.steps
    }

    pub fn names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }
}

impl fmt::Debug for MigrationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationRegistry")
            .field("module", &self.module)
            .field("steps", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    fn noop(name: &str) -> Arc<dyn MigrationStep> {
        FnStep::new(name, |_client| async { Ok(()) }.boxed()).into_arc()
    }

    #[test]
    fn test_register_keeps_order() {
        let mut registry = MigrationRegistry::new(ModuleId::new("tracker"));
        registry.register(noop("s1")).register(noop("s2"));
        registry.register_all(vec![noop("s3")]);

        assert_eq!(registry.names(), vec!["s1", "s2", "s3"]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    #[should_panic(expected = "Duplicate migration step")]
    fn test_register_duplicate_panics() {
        let mut registry = MigrationRegistry::new(ModuleId::new("tracker"));
        registry.register(noop("s1"));
        registry.register(noop("s1"));
    }

    #[test]
    fn test_ensure_unique_names() {
        let module = ModuleId::new("tracker");
        assert!(ensure_unique_names(&module, &[noop("a"), noop("b")]).is_ok());

        let err = ensure_unique_names(&module, &[noop("a"), noop("b"), noop("a")]).unwrap_err();
        assert!(matches!(err, StratumError::DuplicateStep { ref step, .. } if step == "a"));
    }

    #[test]
    fn test_policy_builders() {
        let step = FnStep::new("s", |_client| async { Ok(()) }.boxed()).upgrade_only();
        assert_eq!(step.policy(), StepPolicy::UpgradeOnly);

        let step = FnStep::new("s", |_client| async { Ok(()) }.boxed()).always_in(MigrationMode::Upgrade);
        assert_eq!(step.policy(), StepPolicy::Always(MigrationMode::Upgrade));
    }
}
