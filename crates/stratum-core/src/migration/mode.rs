//! Migration modes and per-step scheduling policies.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Why a workspace is being migrated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MigrationMode {
    /// Brand-new workspace with no legacy data
    #[serde(rename = "create")]
    InitialCreate,
    /// Existing workspace moving to a newer release
    #[serde(rename = "upgrade")]
    Upgrade,
}

impl MigrationMode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            MigrationMode::InitialCreate => "create",
            MigrationMode::Upgrade => "upgrade",
        }
    }
}

impl fmt::Display for MigrationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MigrationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "create" | "initial-create" | "initial_create" => Ok(MigrationMode::InitialCreate),
            "upgrade" => Ok(MigrationMode::Upgrade),
            other => Err(format!(
                "unknown migration mode '{}', expected 'create' or 'upgrade'",
                other
            )),
        }
    }
}

/// When the runner executes a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepPolicy {
    /// Run once, in any mode, while the step is not recorded as completed.
    #[default]
    Once,
    /// Like `Once`, but on `InitialCreate` the step is recorded as completed
    /// without running: a new workspace has no legacy data to fix up.
    UpgradeOnly,
    /// Run on every invocation in the given mode, recorded or not.
    /// In the other mode this behaves as `Once`.
    Always(MigrationMode),
}

/// What the runner does with one step, given the mode and the completed-set snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StepAction {
    Apply,
    RecordOnly,
    Skip,
}

impl StepPolicy {
    pub(crate) fn action(&self, mode: MigrationMode, completed: bool) -> StepAction {
        match self {
            StepPolicy::Always(always_mode) if *always_mode == mode => StepAction::Apply,
            _ if completed => StepAction::Skip,
            StepPolicy::UpgradeOnly if mode == MigrationMode::InitialCreate => {
                StepAction::RecordOnly
            }
            _ => StepAction::Apply,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parsing() {
        assert_eq!("create".parse::<MigrationMode>(), Ok(MigrationMode::InitialCreate));
        assert_eq!("Upgrade".parse::<MigrationMode>(), Ok(MigrationMode::Upgrade));
        assert!("rollback".parse::<MigrationMode>().is_err());
        assert_eq!(MigrationMode::InitialCreate.to_string(), "create");
    }

    #[test]
    fn test_once_runs_only_when_pending() {
        let policy = StepPolicy::Once;
        for mode in [MigrationMode::InitialCreate, MigrationMode::Upgrade] {
            assert_eq!(policy.action(mode, false), StepAction::Apply);
            assert_eq!(policy.action(mode, true), StepAction::Skip);
        }
    }

    #[test]
    fn test_upgrade_only_is_recorded_on_create() {
        let policy = StepPolicy::UpgradeOnly;
        assert_eq!(policy.action(MigrationMode::InitialCreate, false), StepAction::RecordOnly);
        assert_eq!(policy.action(MigrationMode::Upgrade, false), StepAction::Apply);
        assert_eq!(policy.action(MigrationMode::Upgrade, true), StepAction::Skip);
    }

    #[test]
    fn test_always_ignores_completion_in_its_mode() {
        let policy = StepPolicy::Always(MigrationMode::Upgrade);
        assert_eq!(policy.action(MigrationMode::Upgrade, true), StepAction::Apply);
        assert_eq!(policy.action(MigrationMode::InitialCreate, true), StepAction::Skip);
        assert_eq!(policy.action(MigrationMode::InitialCreate, false), StepAction::Apply);
    }
}
