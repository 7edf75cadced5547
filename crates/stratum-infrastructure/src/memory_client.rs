//! In-memory `MigrationClient`.
//!
//! A complete reference store kept entirely in a `tokio::sync::RwLock`. Tests
//! use it to exercise migrations without touching the filesystem.

use crate::collection;
use async_trait::async_trait;
use futures::StreamExt;
use std::collections::BTreeMap;
use std::sync::Arc;
use stratum_core::migration::DocumentStream;
use stratum_core::{DocId, Document, Domain, Filter, MigrationClient, Patch, Result};
use tokio::sync::RwLock;

/// In-memory document store for one workspace.
///
/// Cloning yields another handle onto the same data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMigrationClient {
    domains: Arc<RwLock<BTreeMap<Domain, Vec<Document>>>>,
}

impl InMemoryMigrationClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store pre-populated with `documents`, stored verbatim (no `modifiedOn` stamp).
    pub fn with_documents(documents: impl IntoIterator<Item = (Domain, Document)>) -> Self {
        let mut domains: BTreeMap<Domain, Vec<Document>> = BTreeMap::new();
        for (domain, document) in documents {
            domains.entry(domain).or_default().push(document);
        }
        Self {
            domains: Arc::new(RwLock::new(domains)),
        }
    }

    /// Snapshot of every document in `domain`, in insertion order.
    pub async fn documents(&self, domain: &Domain) -> Vec<Document> {
        self.domains
            .read()
            .await
            .get(domain)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl MigrationClient for InMemoryMigrationClient {
    async fn find(&self, domain: &Domain, filter: &Filter) -> Result<DocumentStream> {
        let domains = self.domains.read().await;
        let matched = match domains.get(domain) {
            Some(docs) => collection::find(docs, filter)?,
            None => {
                filter.validate()?;
                Vec::new()
            }
        };
        Ok(futures::stream::iter(matched.into_iter().map(Ok)).boxed())
    }

    async fn insert(&self, domain: &Domain, document: Document) -> Result<DocId> {
        let mut domains = self.domains.write().await;
        let docs = domains.entry(domain.clone()).or_default();
        collection::insert(domain, docs, document)
    }

    async fn update(&self, domain: &Domain, filter: &Filter, patch: &Patch) -> Result<u64> {
        let mut domains = self.domains.write().await;
        match domains.get_mut(domain) {
            Some(docs) => collection::update(docs, filter, patch),
            None => {
                filter.validate()?;
                patch.validate()?;
                Ok(0)
            }
        }
    }

    async fn remove(&self, domain: &Domain, filter: &Filter) -> Result<u64> {
        let mut domains = self.domains.write().await;
        let Some(docs) = domains.get_mut(domain) else {
            filter.validate()?;
            return Ok(0);
        };
        let removed = collection::remove(docs, filter)?;
        if docs.is_empty() {
            domains.remove(domain);
        }
        Ok(removed)
    }

    async fn domains(&self) -> Result<Vec<Domain>> {
        Ok(self.domains.read().await.keys().cloned().collect())
    }
}
