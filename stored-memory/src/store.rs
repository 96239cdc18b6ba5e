//! In-memory storage implementation for document stores.
//!
//! Documents are kept as BSON values in nested HashMaps,
//! `project -> collection -> document id -> document`, behind an async-aware
//! read-write lock.

use async_trait::async_trait;
use bson::Bson;
use mea::rwlock::RwLock;
use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};
use tracing::debug;

use stored_core::{
    backend::{BackendConnector, StoreBackend},
    error::{StoreError, StoreResult},
    store::{DocumentStore, DocumentStoreBuilder},
};

type CollectionMap = HashMap<String, Bson>;
type StoreMap = HashMap<String, CollectionMap>;
type ProjectMap = HashMap<String, StoreMap>;

/// Connector handing out views on a shared in-memory database.
///
/// Clones share the same data, so a store that is closed and reconnected, or a
/// second store on the same project, sees everything written before. Each
/// project is an isolated namespace.
///
/// # Example
///
/// ```ignore
/// use stored_memory::InMemoryConnector;
///
/// let connector = InMemoryConnector::new();
/// let store = connector.store_builder("my-project").collection("users").build()?;
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryConnector {
    projects: Arc<RwLock<ProjectMap>>,
    connections: Arc<AtomicUsize>,
}

impl InMemoryConnector {
    /// Creates a connector over an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store builder bound to this connector's data.
    pub fn store_builder(&self, project: impl Into<String>) -> DocumentStoreBuilder<Self> {
        DocumentStore::builder(project, self.clone())
    }

    /// Number of backend handles handed out so far.
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BackendConnector for InMemoryConnector {
    type Backend = InMemoryBackend;

    /// Always succeeds; there is nothing to reach.
    async fn connect(&self, project: &str) -> StoreResult<Self::Backend> {
        self.connections.fetch_add(1, Ordering::SeqCst);

        Ok(InMemoryBackend {
            project: project.to_string(),
            projects: Arc::clone(&self.projects),
        })
    }
}

/// Thread-safe in-memory backend handle for one project.
///
/// # Thread Safety
///
/// Reads take a shared lock and writes an exclusive one, so concurrent callers
/// always observe whole documents.
///
/// A collection exists only while it holds at least one document.
#[derive(Clone, Debug)]
pub struct InMemoryBackend {
    project: String,
    projects: Arc<RwLock<ProjectMap>>,
}

impl InMemoryBackend {
    pub fn project(&self) -> &str {
        &self.project
    }
}

#[async_trait]
impl StoreBackend for InMemoryBackend {
    async fn set_document(&self, collection: &str, document: &str, value: Bson) -> StoreResult<()> {
        if value.as_document().is_none() {
            return Err(StoreError::InvalidDocument(format!(
                "{collection}/{document} must be a document, got {:?}",
                value.element_type()
            )));
        }

        let mut projects = self.projects.write().await;

        projects
            .entry(self.project.clone())
            .or_default()
            .entry(collection.to_string())
            .or_default()
            .insert(document.to_string(), value);

        Ok(())
    }

    async fn get_document(&self, collection: &str, document: &str) -> StoreResult<Option<Bson>> {
        Ok(
            self.projects
                .read()
                .await
                .get(&self.project)
                .and_then(|store| store.get(collection))
                .and_then(|collection_map| collection_map.get(document))
                .cloned()
        )
    }

    async fn delete_document(&self, collection: &str, document: &str) -> StoreResult<()> {
        let mut projects = self.projects.write().await;

        let Some(store) = projects.get_mut(&self.project) else {
            return Ok(());
        };

        if let Some(collection_map) = store.get_mut(collection) {
            if collection_map.remove(document).is_none() {
                debug!(collection, document, "delete of missing document ignored");
            }

            if collection_map.is_empty() {
                store.remove(collection);
            }
        }

        Ok(())
    }

    async fn list_collections(&self) -> StoreResult<Vec<String>> {
        Ok(
            self.projects
                .read()
                .await
                .get(&self.project)
                .map(|store| store.keys().cloned().collect())
                .unwrap_or_default()
        )
    }

    async fn list_document_ids(&self, collection: &str) -> StoreResult<Vec<String>> {
        Ok(
            self.projects
                .read()
                .await
                .get(&self.project)
                .and_then(|store| store.get(collection))
                .map(|collection_map| collection_map.keys().cloned().collect())
                .unwrap_or_default()
        )
    }
}
