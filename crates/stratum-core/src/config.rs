//! Engine configuration domain model.
//!
//! Persisted as versioned TOML by the infrastructure layer; this is the
//! latest shape every older file migrates into.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// What the upgrader does when a module's upgrade hook fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookFailurePolicy {
    /// Log the failure, keep running the remaining hooks, and list it in the report.
    #[default]
    Report,
    /// Stop at the first failing hook and fail the upgrade.
    Abort,
}

impl HookFailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookFailurePolicy::Report => "report",
            HookFailurePolicy::Abort => "abort",
        }
    }
}

impl fmt::Display for HookFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HookFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "report" => Ok(HookFailurePolicy::Report),
            "abort" => Ok(HookFailurePolicy::Abort),
            other => Err(format!("unknown hook failure policy '{}'", other)),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Text => f.write_str("text"),
            LogFormat::Json => f.write_str("json"),
        }
    }
}

/// Effective engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Root directory holding one subdirectory per workspace.
    /// `None` means the platform data directory.
    pub data_dir: Option<PathBuf>,
    /// Default `tracing` filter directive when `RUST_LOG` is unset.
    pub log_level: String,
    pub hook_failure_policy: HookFailurePolicy,
    pub log_format: LogFormat,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            log_level: "info".to_string(),
            hook_failure_policy: HookFailurePolicy::default(),
            log_format: LogFormat::default(),
        }
    }
}
