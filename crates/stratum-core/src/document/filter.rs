//! Filters and patches over shape-free documents.
//!
//! Stores share these so matching and patching behave identically across
//! backends. Only top-level fields are addressed.

use super::model::{Document, ID_FIELD, SPACE_FIELD, SpaceRef};
use crate::error::{Result, StratumError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A predicate on a single field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// Field present and equal to the value
    Eq(Value),
    /// Field missing or different from the value
    Ne(Value),
    /// Field present and equal to one of the values
    In(Vec<Value>),
    /// Field presence
    Exists(bool),
}

impl Condition {
    fn matches(&self, field: Option<&Value>) -> bool {
        match (self, field) {
            (Condition::Eq(expected), Some(actual)) => expected == actual,
            (Condition::Eq(_), None) => false,
            (Condition::Ne(expected), Some(actual)) => expected != actual,
            (Condition::Ne(_), None) => true,
            (Condition::In(values), Some(actual)) => values.contains(actual),
            (Condition::In(_), None) => false,
            (Condition::Exists(expected), actual) => *expected == actual.is_some(),
        }
    }
}

/// Conjunction of field conditions. The empty filter matches every document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filter {
    conditions: BTreeMap<String, Condition>,
}

impl Filter {
    /// Matches every document.
    pub fn all() -> Self {
        Self::default()
    }

    /// `{ _id == id }`
    pub fn by_id(id: impl AsRef<str>) -> Self {
        Self::all().where_eq(ID_FIELD, id.as_ref())
    }

    /// `{ space == space }`
    pub fn in_space(space: &SpaceRef) -> Self {
        Self::all().where_eq(SPACE_FIELD, space.as_str())
    }

    pub fn where_eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(field, Condition::Eq(value.into()))
    }

    pub fn where_ne(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(field, Condition::Ne(value.into()))
    }

    pub fn where_in<V: Into<Value>>(self, field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.with(field, Condition::In(values))
    }

    pub fn where_exists(self, field: impl Into<String>, present: bool) -> Self {
        self.with(field, Condition::Exists(present))
    }

    /// Adds a condition; a later condition on the same field replaces the earlier one.
    pub fn with(mut self, field: impl Into<String>, condition: Condition) -> Self {
        self.conditions.insert(field.into(), condition);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn conditions(&self) -> impl Iterator<Item = (&str, &Condition)> {
        self.conditions.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Rejects filters no store can evaluate.
    pub fn validate(&self) -> Result<()> {
        for (field, _) in self.conditions() {
            if field.is_empty() {
                return Err(StratumError::InvalidFilter(
                    "filter field name must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.conditions
            .iter()
            .all(|(field, condition)| condition.matches(doc.get(field)))
    }
}

/// A change to a single field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchOp {
    Set(Value),
    Unset,
}

/// Per-field changes applied to every matched document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Patch {
    ops: BTreeMap<String, PatchOp>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.ops.insert(field.into(), PatchOp::Set(value.into()));
        self
    }

    pub fn unset(mut self, field: impl Into<String>) -> Self {
        self.ops.insert(field.into(), PatchOp::Unset);
        self
    }

    /// `{ space := space }`
    pub fn move_to(space: &SpaceRef) -> Self {
        Self::new().set(SPACE_FIELD, space.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Rejects patches that would rewrite document identity.
    pub fn validate(&self) -> Result<()> {
        if self.ops.contains_key(ID_FIELD) {
            return Err(StratumError::InvalidPatch(format!(
                "'{}' cannot be patched",
                ID_FIELD
            )));
        }
        if self.ops.keys().any(String::is_empty) {
            return Err(StratumError::InvalidPatch(
                "patch field name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Applies the patch in place. Returns whether the document changed.
    pub fn apply(&self, doc: &mut Document) -> bool {
        let mut changed = false;
        for (field, op) in &self.ops {
            match op {
                PatchOp::Set(value) => {
                    if doc.get(field) != Some(value) {
                        doc.set(field.clone(), value.clone());
                        changed = true;
                    }
                }
                PatchOp::Unset => {
                    if doc.unset(field).is_some() {
                        changed = true;
                    }
                }
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc() -> Document {
        Document::new("d1")
            .with_space(&SpaceRef::new("setting:space:Setting"))
            .with("kind", "integration")
            .with("rank", 3)
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(Filter::all().matches(&doc()));
        assert!(Filter::all().matches(&Document::default()));
    }

    #[test]
    fn test_conditions_are_conjunctive() {
        let filter = Filter::in_space(&SpaceRef::new("setting:space:Setting")).where_eq("kind", "integration");
        assert!(filter.matches(&doc()));

        let filter = filter.where_eq("rank", 4);
        assert!(!filter.matches(&doc()));
    }

    #[test]
    fn test_missing_fields() {
        let d = doc();
        assert!(!Filter::all().where_eq("archived", true).matches(&d));
        assert!(Filter::all().where_ne("archived", true).matches(&d));
        assert!(Filter::all().where_exists("archived", false).matches(&d));
        assert!(Filter::all().where_exists("kind", true).matches(&d));
        assert!(!Filter::all().where_in("archived", [true, false]).matches(&d));
        assert!(Filter::all().where_in("rank", [1, 2, 3]).matches(&d));
    }

    #[test]
    fn test_patch_reports_change_only_when_document_differs() {
        let mut d = doc();
        let patch = Patch::move_to(&SpaceRef::workspace());

        assert!(patch.apply(&mut d));
        assert_eq!(d.space(), Some(SpaceRef::workspace()));
        // Second application is a no-op
        assert!(!patch.apply(&mut d));

        let unset = Patch::new().unset("rank").unset("never-there");
        assert!(unset.apply(&mut d));
        assert!(d.get("rank").is_none());
        assert!(!unset.apply(&mut d));
    }

    #[test]
    fn test_patch_cannot_rewrite_id() {
        let err = Patch::new().set("_id", "other").validate().unwrap_err();
        assert!(matches!(err, StratumError::InvalidPatch(_)));
        assert!(Patch::move_to(&SpaceRef::workspace()).validate().is_ok());
    }

    #[test]
    fn test_filter_round_trips_through_json() {
        let filter = Filter::by_id("d1").where_exists("space", true);
        let value = serde_json::to_value(&filter).unwrap();
        assert_eq!(value, json!({ "_id": { "eq": "d1" }, "space": { "exists": true } }));
        let back: Filter = serde_json::from_value(value).unwrap();
        assert_eq!(back, filter);
        assert!(Filter::all().where_eq("", 1).validate().is_err());
    }
}
