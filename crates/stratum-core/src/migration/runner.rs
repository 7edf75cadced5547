//! The migration runner.
//!
//! Walks a module's ordered step list against one workspace, executing steps
//! that are not yet recorded as completed and persisting each completion
//! before moving on.

use super::client::MigrationClient;
use super::mode::{MigrationMode, StepAction};
use super::step::{MigrationStep, ensure_unique_names};
use crate::document::ModuleId;
use crate::error::{Result, StratumError};
use std::sync::Arc;
use std::time::Instant;

/// What one runner invocation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationOutcome {
    pub module: ModuleId,
    pub mode: MigrationMode,
    /// Steps whose `apply` ran, in execution order
    pub applied: Vec<String>,
    /// Pending steps recorded as completed without running (mode-gated)
    pub recorded_only: Vec<String>,
    /// Steps skipped because they were already completed
    pub already_done: Vec<String>,
}

impl MigrationOutcome {
    fn new(module: &ModuleId, mode: MigrationMode) -> Self {
        Self {
            module: module.clone(),
            mode,
            applied: Vec::new(),
            recorded_only: Vec::new(),
            already_done: Vec::new(),
        }
    }

    /// True when nothing ran and nothing new was recorded.
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty() && self.recorded_only.is_empty()
    }
}

/// Runs the pending steps of one module against one workspace.
///
/// The completed-set is read once, at the start of the run, so every decision
/// in the run sees the same snapshot. After each successful step the whole set
/// is persisted immediately, before the next step starts.
///
/// # Errors
///
/// - `DuplicateStep` if two steps share a name (nothing runs)
/// - `StepFailed` if a step's `apply` fails; earlier completions stay recorded,
///   the failed step and everything after it stay pending
/// - `StatePersistence` if a step applied but its completion could not be
///   written; the next run will apply it again
/// - any error from reading the initial state, unwrapped
///
/// The caller must ensure only one invocation per (workspace, module) is in
/// flight; the runner does no locking of its own.
pub async fn try_migrate(
    mode: MigrationMode,
    client: &dyn MigrationClient,
    module: &ModuleId,
    steps: &[Arc<dyn MigrationStep>],
) -> Result<MigrationOutcome> {
    ensure_unique_names(module, steps)?;

    let mut completed = client.get_migration_state(module).await?;
    let mut outcome = MigrationOutcome::new(module, mode);

    tracing::debug!(
        module = %module,
        mode = %mode,
        "Loaded migration state: {} of {} steps completed",
        completed.len(),
        steps.len()
    );

    for (i, step) in steps.iter().enumerate() {
        let name = step.name();

        match step.policy().action(mode, completed.contains(name)) {
            StepAction::Skip => {
                outcome.already_done.push(name.to_string());
            }
            StepAction::RecordOnly => {
                tracing::info!(
                    module = %module,
                    step = name,
                    mode = %mode,
                    "Recording step as completed without running it"
                );
                completed.insert(name);
                client
                    .set_migration_state(module, &completed)
                    .await
                    .map_err(|e| StratumError::state_persistence(module.as_str(), name, e))?;
                outcome.recorded_only.push(name.to_string());
            }
            StepAction::Apply => {
                tracing::info!(
                    module = %module,
                    step = name,
                    mode = %mode,
                    "Migration step {}/{}: {}",
                    i + 1,
                    steps.len(),
                    name
                );
                let started = Instant::now();

                if let Err(e) = step.apply(client).await {
                    tracing::error!(
                        module = %module,
                        step = name,
                        "Migration step failed after {:?}: {}",
                        started.elapsed(),
                        e
                    );
                    return Err(StratumError::step_failed(module.as_str(), name, e));
                }

                if completed.insert(name) {
                    client
                        .set_migration_state(module, &completed)
                        .await
                        .map_err(|e| {
                            tracing::error!(
                                module = %module,
                                step = name,
                                "Step applied but completion was not persisted: {}",
                                e
                            );
                            StratumError::state_persistence(module.as_str(), name, e)
                        })?;
                }

                tracing::info!(
                    module = %module,
                    step = name,
                    "Migration step completed in {:?}",
                    started.elapsed()
                );
                outcome.applied.push(name.to_string());
            }
        }
    }

    if outcome.is_noop() {
        tracing::debug!(module = %module, "No pending migration steps");
    } else {
        tracing::info!(
            module = %module,
            "Migration completed: {} applied, {} recorded without running",
            outcome.applied.len(),
            outcome.recorded_only.len()
        );
    }

    Ok(outcome)
}
