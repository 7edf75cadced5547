//! Document-collection operations shared by the reference stores.
//!
//! Both stores keep each domain as a `Vec<Document>` in insertion order; these
//! helpers implement the `MigrationClient` semantics over such a vector.

use chrono::Utc;
use serde_json::Value;
use stratum_core::document::{ID_FIELD, MODIFIED_ON_FIELD};
use stratum_core::{DocId, Document, Domain, Filter, Patch, Result, StratumError};

/// Current time as epoch milliseconds, the `modifiedOn` representation.
pub(crate) fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

pub(crate) fn find(docs: &[Document], filter: &Filter) -> Result<Vec<Document>> {
    filter.validate()?;
    Ok(docs.iter().filter(|doc| filter.matches(doc)).cloned().collect())
}

/// Appends `document`, generating an `_id` when absent.
///
/// A present `_id` that is not a string is rejected rather than replaced.
pub(crate) fn insert(domain: &Domain, docs: &mut Vec<Document>, mut document: Document) -> Result<DocId> {
    let id = match document.get(ID_FIELD) {
        Some(Value::String(id)) => DocId::new(id.as_str()),
        Some(other) => {
            return Err(StratumError::InvalidDocument(format!(
                "'{}' must be a string in domain '{}', got {}",
                ID_FIELD, domain, other
            )));
        }
        None => {
            let id = DocId::generate();
            document.set(ID_FIELD, Value::String(id.to_string()));
            id
        }
    };

    if docs.iter().any(|existing| existing.id().as_ref() == Some(&id)) {
        return Err(StratumError::DuplicateDocument {
            domain: domain.to_string(),
            id: id.to_string(),
        });
    }

    document.set(MODIFIED_ON_FIELD, Value::from(now_millis()));
    docs.push(document);
    Ok(id)
}

/// Applies `patch` to every match; only documents that changed are stamped and counted.
pub(crate) fn update(docs: &mut [Document], filter: &Filter, patch: &Patch) -> Result<u64> {
    filter.validate()?;
    patch.validate()?;

    let stamp = now_millis();
    let mut changed = 0u64;
    for doc in docs.iter_mut().filter(|doc| filter.matches(doc)) {
        if patch.apply(doc) {
            doc.set(MODIFIED_ON_FIELD, Value::from(stamp));
            changed += 1;
        }
    }
    Ok(changed)
}

pub(crate) fn remove(docs: &mut Vec<Document>, filter: &Filter) -> Result<u64> {
    filter.validate()?;

    let before = docs.len();
    docs.retain(|doc| !filter.matches(doc));
    Ok((before - docs.len()) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratum_core::SpaceRef;

    fn domain() -> Domain {
        Domain::new("task")
    }

    #[test]
    fn test_insert_assigns_id_and_stamps() {
        let mut docs = Vec::new();
        let id = insert(&domain(), &mut docs, Document::default()).unwrap();

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id(), Some(id));
        assert!(docs[0].get(MODIFIED_ON_FIELD).is_some());
    }

    #[test]
    fn test_insert_duplicate_rejected() {
        let mut docs = Vec::new();
        insert(&domain(), &mut docs, Document::new("a")).unwrap();

        let err = insert(&domain(), &mut docs, Document::new("a")).unwrap_err();
        assert!(matches!(err, StratumError::DuplicateDocument { .. }));
        assert_eq!(docs.len(), 1);
    }

    #[test]
    fn test_insert_rejects_non_string_id() {
        let mut docs = Vec::new();
        let legacy = Document::default().with(ID_FIELD, 42).with("title", "legacy");

        let err = insert(&domain(), &mut docs, legacy).unwrap_err();

        assert!(matches!(err, StratumError::InvalidDocument(_)));
        assert!(!err.is_transient());
        assert!(docs.is_empty());
    }

    #[test]
    fn test_update_counts_only_changed() {
        let old = SpaceRef::new("old");
        let new = SpaceRef::new("new");
        let mut docs = vec![
            Document::new("a").with_space(&old),
            Document::new("b").with_space(&new),
        ];

        let changed = update(&mut docs, &Filter::all(), &Patch::move_to(&new)).unwrap();

        assert_eq!(changed, 1);
        assert!(docs[0].get(MODIFIED_ON_FIELD).is_some());
        assert!(docs[1].get(MODIFIED_ON_FIELD).is_none());
    }

    #[test]
    fn test_update_rejects_id_patch() {
        let mut docs = vec![Document::new("a")];
        let err = update(&mut docs, &Filter::all(), &Patch::new().set("_id", "b")).unwrap_err();

        assert!(matches!(err, StratumError::InvalidPatch(_)));
        assert_eq!(docs[0].id(), Some(DocId::new("a")));
    }

    #[test]
    fn test_remove() {
        let mut docs = vec![Document::new("a"), Document::new("b")];
        assert_eq!(remove(&mut docs, &Filter::by_id("a")).unwrap(), 1);
        assert_eq!(remove(&mut docs, &Filter::by_id("a")).unwrap(), 0);
        assert_eq!(docs.len(), 1);
    }
}
