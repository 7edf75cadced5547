//! Error types for the Stratum migration engine.

use thiserror::Error;

/// A shared error type for every Stratum crate.
///
/// Store capabilities raise the leaf variants (`Transient`, `InvalidFilter`, ...).
/// The runner and the upgrader wrap them into the context variants
/// (`StepFailed`, `StatePersistence`, `ModuleFailed`, `HookFailed`) so callers can
/// tell where a run stopped.
#[derive(Error, Debug, Clone)]
pub enum StratumError {
    /// Timeout or connectivity failure in the backing store. Retrying the run later may succeed.
    #[error("Transient storage error: {0}")]
    Transient(String),

    /// A filter the store cannot evaluate
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// A patch the store refuses to apply
    #[error("Invalid patch: {0}")]
    InvalidPatch(String),

    /// A document the store refuses to accept as written
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Domain name unknown to (or unusable by) the store
    #[error("Unknown domain: {0}")]
    UnknownDomain(String),

    /// Insert of a document whose `_id` already exists in the domain
    #[error("Duplicate document '{id}' in domain '{domain}'")]
    DuplicateDocument { domain: String, id: String },

    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Two steps of one module share a name
    #[error("Duplicate migration step '{step}' in module '{module}'")]
    DuplicateStep { module: String, step: String },

    /// Two operations registered for the same module
    #[error("Module '{0}' registered more than once")]
    DuplicateModule(String),

    /// A step's transformation failed; the step stays pending
    #[error("Migration step '{step}' of module '{module}' failed: {source}")]
    StepFailed {
        module: String,
        step: String,
        #[source]
        source: Box<StratumError>,
    },

    /// The step applied but its completion could not be recorded
    #[error("Step '{step}' of module '{module}' applied but its completion was not persisted: {source}")]
    StatePersistence {
        module: String,
        step: String,
        #[source]
        source: Box<StratumError>,
    },

    /// Structural migration of a module aborted the workspace upgrade
    #[error("Migration of module '{module}' aborted: {source}")]
    ModuleFailed {
        module: String,
        #[source]
        source: Box<StratumError>,
    },

    /// Upgrade hook failure (only raised under the abort policy)
    #[error("Upgrade hook of module '{module}' failed: {source}")]
    HookFailed {
        module: String,
        #[source]
        source: Box<StratumError>,
    },

    /// Another process holds the workspace upgrade lock
    #[error("Workspace is locked: {0}")]
    Locked(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StratumError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Transient error
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient(message.into())
    }

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub(crate) fn step_failed(module: &str, step: &str, source: StratumError) -> Self {
        Self::StepFailed {
            module: module.to_string(),
            step: step.to_string(),
            source: Box::new(source),
        }
    }

    pub(crate) fn state_persistence(module: &str, step: &str, source: StratumError) -> Self {
        Self::StatePersistence {
            module: module.to_string(),
            step: step.to_string(),
            source: Box::new(source),
        }
    }

    /// Creates a ModuleFailed error
    pub fn module_failed(module: impl Into<String>, source: StratumError) -> Self {
        Self::ModuleFailed {
            module: module.into(),
            source: Box::new(source),
        }
    }

    /// Creates a HookFailed error
    pub fn hook_failed(module: impl Into<String>, source: StratumError) -> Self {
        Self::HookFailed {
            module: module.into(),
            source: Box::new(source),
        }
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if retrying the whole run later may succeed without a code or data fix.
    ///
    /// Wrapper variants report the transience of the error they wrap.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transient(_) | Self::Locked(_) => true,
            Self::StepFailed { source, .. }
            | Self::StatePersistence { source, .. }
            | Self::ModuleFailed { source, .. }
            | Self::HookFailed { source, .. } => source.is_transient(),
            _ => false,
        }
    }

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if the error means an apply succeeded but its completion record was lost
    pub fn is_state_persistence(&self) -> bool {
        match self {
            Self::StatePersistence { .. } => true,
            Self::ModuleFailed { source, .. } => source.is_state_persistence(),
            _ => false,
        }
    }

    /// Name of the migration step the run stopped at, if the error carries one.
    pub fn step_name(&self) -> Option<&str> {
        match self {
            Self::StepFailed { step, .. } | Self::StatePersistence { step, .. } => Some(step),
            Self::ModuleFailed { source, .. } => source.step_name(),
            _ => None,
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for StratumError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::Interrupted => {
                Self::Transient(err.to_string())
            }
            kind => Self::Io {
                message: format!("{} (kind: {:?})", err, kind),
            },
        }
    }
}

impl From<serde_json::Error> for StratumError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for StratumError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for StratumError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<version_migrate::MigrationError> for StratumError {
    fn from(err: version_migrate::MigrationError) -> Self {
        Self::Config(format!("failed to migrate configuration: {}", err))
    }
}

/// A type alias for `Result<T, StratumError>`.
pub type Result<T> = std::result::Result<T, StratumError>;
