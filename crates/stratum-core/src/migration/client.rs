//! Migration client trait.
//!
//! Defines the capabilities migrations need from a workspace's document store.
//! The engine consumes this interface; backends implement it.

use super::state::{CompletedSet, MigrationStateRecord};
use crate::document::{DocId, Document, Domain, Filter, ModuleId, Patch, SpaceRef};
use crate::error::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};

/// Lazy sequence of documents produced by [`MigrationClient::find`].
///
/// Calling `find` again restarts the scan from the beginning.
pub type DocumentStream = BoxStream<'static, Result<Document>>;

/// Store capabilities bound to exactly one workspace.
///
/// # Implementation Notes
///
/// Implementations should:
/// - Apply `update`/`move_to` atomically per matched document (not across the match set)
/// - Make `set_migration_state` durable before it returns
/// - Report timeouts and connectivity failures as `StratumError::Transient`
///
/// The migration state methods have default implementations that keep one
/// [`MigrationStateRecord`] per module in the reserved `migration` domain.
#[async_trait]
pub trait MigrationClient: Send + Sync {
    /// Finds documents in `domain` matching `filter`.
    async fn find(&self, domain: &Domain, filter: &Filter) -> Result<DocumentStream>;

    /// Inserts a document, assigning a fresh `_id` when it has none.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateDocument` if the domain already holds a document with that id.
    async fn insert(&self, domain: &Domain, document: Document) -> Result<DocId>;

    /// Applies `patch` to every matched document.
    ///
    /// # Returns
    ///
    /// The number of documents that actually changed.
    async fn update(&self, domain: &Domain, filter: &Filter, patch: &Patch) -> Result<u64>;

    /// Deletes every matched document and returns how many were removed.
    async fn remove(&self, domain: &Domain, filter: &Filter) -> Result<u64>;

    /// Lists the domains currently holding documents.
    async fn domains(&self) -> Result<Vec<Domain>>;

    /// Reassigns the container reference of every matched document.
    async fn move_to(&self, domain: &Domain, filter: &Filter, space: &SpaceRef) -> Result<u64> {
        self.update(domain, filter, &Patch::move_to(space)).await
    }

    /// Returns the first matched document, if any.
    async fn find_one(&self, domain: &Domain, filter: &Filter) -> Result<Option<Document>> {
        let mut stream = self.find(domain, filter).await?;
        stream.next().await.transpose()
    }

    /// Counts matched documents.
    async fn count(&self, domain: &Domain, filter: &Filter) -> Result<u64> {
        self.find(domain, filter)
            .await?
            .try_fold(0u64, |n, _| async move { Ok(n + 1) })
            .await
    }

    /// Reads a module's completed-set; empty when the module was never migrated.
    async fn get_migration_state(&self, module: &ModuleId) -> Result<CompletedSet> {
        let filter = Filter::by_id(MigrationStateRecord::record_id(module));
        match self.find_one(&Domain::migration(), &filter).await? {
            Some(doc) => Ok(MigrationStateRecord::from_document(doc)?.completed),
            None => Ok(CompletedSet::new()),
        }
    }

    /// Persists a module's completed-set, replacing the previous one.
    async fn set_migration_state(&self, module: &ModuleId, completed: &CompletedSet) -> Result<()> {
        let domain = Domain::migration();
        let record = MigrationStateRecord::new(module, completed.clone());
        let filter = Filter::by_id(&record.id);

        if self.find_one(&domain, &filter).await?.is_some() {
            let patch = Patch::new().set("completed", serde_json::to_value(&record.completed)?);
            self.update(&domain, &filter, &patch).await?;
        } else {
            self.insert(&domain, record.to_document()?).await?;
        }
        Ok(())
    }
}
