//! Persisted migration state.
//!
//! One `MigrationStateRecord` per (workspace, module) lives in the reserved
//! `migration` domain of the workspace's own store, so it is backed up and
//! restored together with the data it describes.

use crate::document::{DocId, Document, ModuleId, SpaceRef};
use crate::error::{Result, StratumError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Class stamped on migration state records.
pub const MIGRATION_STATE_CLASS: &str = "core:class:MigrationState";

/// The set of step names known to have completed for one module.
///
/// Serialized as a sorted array, so equal sets always encode identically.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompletedSet(BTreeSet<String>);

impl CompletedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, step: &str) -> bool {
        self.0.contains(step)
    }

    /// Returns `true` if the name was not present before.
    pub fn insert(&mut self, step: impl Into<String>) -> bool {
        self.0.insert(step.into())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for CompletedSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// The stored form of a module's completed-set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationStateRecord {
    #[serde(rename = "_id")]
    pub id: DocId,
    #[serde(rename = "_class")]
    pub class: String,
    pub space: SpaceRef,
    pub module: ModuleId,
    #[serde(default)]
    pub completed: CompletedSet,
}

impl MigrationStateRecord {
    pub fn new(module: &ModuleId, completed: CompletedSet) -> Self {
        Self {
            id: Self::record_id(module),
            class: MIGRATION_STATE_CLASS.to_string(),
            space: SpaceRef::workspace(),
            module: module.clone(),
            completed,
        }
    }

    /// Deterministic document id of a module's record.
    pub fn record_id(module: &ModuleId) -> DocId {
        DocId::new(format!("migration-state:{}", module))
    }

    pub fn to_document(&self) -> Result<Document> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(fields) => Ok(Document::from(fields)),
            other => Err(StratumError::internal(format!(
                "migration state record serialized to a non-object: {}",
                other
            ))),
        }
    }

    pub fn from_document(doc: Document) -> Result<Self> {
        let record: Self = serde_json::from_value(serde_json::Value::Object(doc.into_fields()))?;
        Ok(record)
    }
}

/// Snapshot of every module's completed-set, handed to upgrade hooks.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MigrationStates(BTreeMap<ModuleId, CompletedSet>);

impl MigrationStates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, module: ModuleId, completed: CompletedSet) {
        self.0.insert(module, completed);
    }

    pub fn get(&self, module: &ModuleId) -> Option<&CompletedSet> {
        self.0.get(module)
    }

    pub fn is_completed(&self, module: &ModuleId, step: &str) -> bool {
        self.get(module).is_some_and(|set| set.contains(step))
    }

    pub fn modules(&self) -> impl Iterator<Item = (&ModuleId, &CompletedSet)> {
        self.0.iter()
    }
}
