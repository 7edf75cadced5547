//! File-backed `MigrationClient`.
//!
//! # Layout
//!
//! ```text
//! <workspace_dir>/
//! ├── .upgrade.lock      # WorkspaceLock (not managed here)
//! ├── .store.lock        # Held around every read-modify-write
//! ├── migration.json     # MigrationStateRecord per module
//! ├── space.json         # Space containers
//! └── <domain>.json      # Array of documents, insertion order
//! ```
//!
//! Every mutation rewrites the domain file through [`AtomicJsonFile`], so a
//! completed-set persisted by `set_migration_state` is on disk before the call
//! returns. Each operation holds the directory's store lock from load to save,
//! so any number of handles on one directory (clones, independent `open`s or
//! other processes) never lose or tear each other's writes. Keeping a whole
//! upgrade exclusive is the job of `WorkspaceLock`.

use crate::collection;
use crate::storage::atomic_file::{AtomicJsonFile, io_context};
use crate::storage::lock::StoreLock;
use async_trait::async_trait;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use stratum_core::migration::DocumentStream;
use stratum_core::{DocId, Document, Domain, Filter, MigrationClient, Patch, Result, StratumError};
use tokio::fs;

const DOMAIN_FILE_EXTENSION: &str = "json";

/// Document store for one workspace directory.
#[derive(Debug, Clone)]
pub struct FileMigrationClient {
    root: PathBuf,
}

impl FileMigrationClient {
    /// Opens (creating if needed) the workspace directory at `root`.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .map_err(|e| io_context(e, "create directory", &root))?;

        tracing::debug!("Opened file store at {}", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn lock(&self) -> Result<StoreLock> {
        StoreLock::acquire(&self.root).await
    }

    fn domain_file(&self, domain: &Domain) -> Result<AtomicJsonFile<Vec<Document>>> {
        validate_domain_name(domain)?;
        Ok(AtomicJsonFile::new(
            self.root
                .join(format!("{}.{}", domain, DOMAIN_FILE_EXTENSION)),
        ))
    }

    async fn load(&self, file: &AtomicJsonFile<Vec<Document>>) -> Result<Vec<Document>> {
        Ok(file.load().await?.unwrap_or_default())
    }

    /// Writes `docs` back, deleting the file once the domain is empty.
    async fn store(&self, file: &AtomicJsonFile<Vec<Document>>, docs: Vec<Document>) -> Result<()> {
        if !docs.is_empty() {
            return file.save(&docs).await;
        }
        match fs::remove_file(file.path()).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_context(e, "remove", file.path())),
        }
    }
}

/// Domain names become file names, so only `[A-Za-z0-9_-]+` is accepted.
fn validate_domain_name(domain: &Domain) -> Result<()> {
    let name = domain.as_str();
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StratumError::UnknownDomain(format!(
            "'{}' is not a valid domain name for the file store",
            name
        )))
    }
}

#[async_trait]
impl MigrationClient for FileMigrationClient {
    async fn find(&self, domain: &Domain, filter: &Filter) -> Result<DocumentStream> {
        let file = self.domain_file(domain)?;
        let _guard = self.lock().await?;

        let docs = self.load(&file).await?;
        let matched = collection::find(&docs, filter)?;
        Ok(futures::stream::iter(matched.into_iter().map(Ok)).boxed())
    }

    async fn insert(&self, domain: &Domain, document: Document) -> Result<DocId> {
        let file = self.domain_file(domain)?;
        let _guard = self.lock().await?;

        let mut docs = self.load(&file).await?;
        let id = collection::insert(domain, &mut docs, document)?;
        self.store(&file, docs).await?;
        Ok(id)
    }

    async fn update(&self, domain: &Domain, filter: &Filter, patch: &Patch) -> Result<u64> {
        let file = self.domain_file(domain)?;
        let _guard = self.lock().await?;

        let mut docs = self.load(&file).await?;
        let changed = collection::update(&mut docs, filter, patch)?;
        if changed > 0 {
            self.store(&file, docs).await?;
        }
        Ok(changed)
    }

    async fn remove(&self, domain: &Domain, filter: &Filter) -> Result<u64> {
        let file = self.domain_file(domain)?;
        let _guard = self.lock().await?;

        let mut docs = self.load(&file).await?;
        let removed = collection::remove(&mut docs, filter)?;
        if removed > 0 {
            self.store(&file, docs).await?;
        }
        Ok(removed)
    }

    async fn domains(&self) -> Result<Vec<Domain>> {
        let _guard = self.lock().await?;

        let mut entries = fs::read_dir(&self.root)
            .await
            .map_err(|e| io_context(e, "read directory", &self.root))?;

        let mut domains = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| io_context(e, "read directory", &self.root))?
        {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(DOMAIN_FILE_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            let domain = Domain::new(stem);
            // Foreign files whose stem is not a domain name
            if validate_domain_name(&domain).is_ok() {
                domains.push(domain);
            }
        }
        domains.sort();
        Ok(domains)
    }
}
