//! The store contract and its generic adapter.
//!
//! This module provides the primary API for working with documents:
//!
//! - [`Store`] - The backend-agnostic contract callers program against
//! - [`DocumentStore`] - The adapter implementing [`Store`] on top of any [`BackendConnector`]
//! - [`DocumentStoreBuilder`] - Configuration for a [`DocumentStore`]
//!
//! # Example
//!
//! ```ignore
//! use stored_core::store::{DocumentStore, Store};
//!
//! let store = DocumentStore::builder("my-project", connector)
//!     .collection("users")
//!     .build()?;
//!
//! store.store_item(&"alice".into(), doc).await?;
//! let ids = store.list().await?;
//! store.close().await;
//! ```

use async_trait::async_trait;
use mea::rwlock::RwLock;
use std::{fmt, sync::Arc};
use tracing::{debug, info};

use crate::{
    backend::{BackendConnector, StoreBackend},
    document::{Identity, Marshaler, Storable, UnMarshaler},
    error::{StoreError, StoreResult},
    id::{DocumentPath, Id, Scope},
};

/// Callback invoked by [`Store::apply`] once per document.
///
/// Returning an error stops the traversal.
pub type ItemHandler<'a> = dyn FnMut(Id, Storable) -> StoreResult<()> + Send + 'a;

/// Backend-agnostic document store.
///
/// Every operation suspends the calling task until the backend round-trip
/// completes and returns a single error on failure. Nothing is retried.
#[async_trait]
pub trait Store: Send + Sync {
    /// Creates or overwrites the document at `id`.
    async fn store_item(&self, id: &Id, doc: Storable) -> StoreResult<()>;

    /// Fetches the document at `id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no document exists at `id`.
    async fn retrieve(&self, id: &Id) -> StoreResult<Storable>;

    /// Removes the document at `id`.
    ///
    /// Deleting an id that holds no document succeeds.
    async fn delete(&self, id: &Id) -> StoreResult<()>;

    /// Returns every id visible to this store, in no particular order.
    async fn list(&self) -> StoreResult<Vec<Id>>;

    /// Retrieves every listed document and passes it to `handler`.
    ///
    /// The first error from listing, retrieval or the handler aborts the
    /// traversal and is returned.
    async fn apply(&self, handler: &mut ItemHandler<'_>) -> StoreResult<()>;

    /// Releases the connection. Safe to call when never connected.
    async fn close(&self);
}

/// [`Store`] implementation over a collection-scoped document backend.
///
/// The connection is established lazily on the first operation and shared
/// between concurrent callers; only one connect attempt runs at a time. A
/// failed attempt leaves the store unconnected so the next operation retries.
///
/// When built with a collection, ids are relative to that collection. Without
/// one, ids are `<collection>/<document>` and [`Store::list`] spans every
/// collection.
pub struct DocumentStore<C: BackendConnector> {
    project: String,
    scope: Scope,
    marshaler: Arc<dyn Marshaler>,
    unmarshaler: Arc<dyn UnMarshaler>,
    connector: C,
    connection: RwLock<Option<Arc<C::Backend>>>,
}

impl<C: BackendConnector> DocumentStore<C> {
    /// Creates a builder for a store in `project`, reached through `connector`.
    pub fn builder(project: impl Into<String>, connector: C) -> DocumentStoreBuilder<C> {
        DocumentStoreBuilder::new(project, connector)
    }

    /// Creates an unscoped store with identity hooks.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Configuration`] if `project` is empty.
    pub fn new(project: impl Into<String>, connector: C) -> StoreResult<Self> {
        Self::builder(project, connector).build()
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Returns whether a connection is currently established.
    pub async fn is_connected(&self) -> bool {
        self.connection.read().await.is_some()
    }

    /// Returns the live backend handle, establishing it first if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Connection`] if the connector fails.
    pub async fn connect(&self) -> StoreResult<Arc<C::Backend>> {
        if let Some(backend) = self.connection.read().await.as_ref() {
            return Ok(Arc::clone(backend));
        }

        let mut connection = self.connection.write().await;

        // Another caller may have connected while we waited for the write lock.
        if let Some(backend) = connection.as_ref() {
            return Ok(Arc::clone(backend));
        }

        let backend = Arc::new(self.connector.connect(&self.project).await?);
        info!(project = %self.project, "connected to backend");

        *connection = Some(Arc::clone(&backend));

        Ok(backend)
    }

    /// Collects the ids of one collection, in the caller-visible form.
    async fn collect_ids(
        &self,
        backend: &C::Backend,
        collection: &str,
        ids: &mut Vec<Id>,
    ) -> StoreResult<()> {
        let documents = backend.list_document_ids(collection).await?;
        debug!(collection, count = documents.len(), "listed documents");

        ids.extend(
            documents
                .iter()
                .map(|document| self.scope.strip(&Id::from_parts(collection, document))),
        );

        Ok(())
    }
}

#[async_trait]
impl<C: BackendConnector> Store for DocumentStore<C> {
    async fn store_item(&self, id: &Id, doc: Storable) -> StoreResult<()> {
        let qualified = self.scope.qualify(id)?;
        let path = DocumentPath::parse(&qualified)?;
        let value = self.marshaler.marshal(doc)?;
        let backend = self.connect().await?;

        debug!(id = %qualified, "storing document");

        backend
            .set_document(path.collection, path.document, value)
            .await
    }

    async fn retrieve(&self, id: &Id) -> StoreResult<Storable> {
        let qualified = self.scope.qualify(id)?;
        let path = DocumentPath::parse(&qualified)?;
        let backend = self.connect().await?;

        debug!(id = %qualified, "retrieving document");

        let raw = backend
            .get_document(path.collection, path.document)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        self.unmarshaler.unmarshal(raw)
    }

    async fn delete(&self, id: &Id) -> StoreResult<()> {
        let qualified = self.scope.qualify(id)?;
        let path = DocumentPath::parse(&qualified)?;
        let backend = self.connect().await?;

        debug!(id = %qualified, "deleting document");

        backend
            .delete_document(path.collection, path.document)
            .await
    }

    async fn list(&self) -> StoreResult<Vec<Id>> {
        let backend = self.connect().await?;
        let mut ids = Vec::new();

        match self.scope.name() {
            Some(collection) => {
                self.collect_ids(&backend, collection, &mut ids).await?;
            }
            None => {
                for collection in backend.list_collections().await? {
                    self.collect_ids(&backend, &collection, &mut ids).await?;
                }
            }
        }

        Ok(ids)
    }

    async fn apply(&self, handler: &mut ItemHandler<'_>) -> StoreResult<()> {
        for id in self.list().await? {
            let doc = self.retrieve(&id).await?;
            handler(id, doc)?;
        }

        Ok(())
    }

    async fn close(&self) {
        let backend = self.connection.write().await.take();

        if let Some(backend) = backend {
            backend.close().await;
            info!(project = %self.project, "closed backend connection");
        }
    }
}

impl<C: BackendConnector> fmt::Debug for DocumentStore<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentStore")
            .field("project", &self.project)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

/// Builder for [`DocumentStore`] instances.
///
/// Scope and hooks are fixed once [`build`](DocumentStoreBuilder::build) returns.
pub struct DocumentStoreBuilder<C> {
    project: String,
    collection: Option<String>,
    marshaler: Arc<dyn Marshaler>,
    unmarshaler: Arc<dyn UnMarshaler>,
    connector: C,
}

impl<C: BackendConnector> DocumentStoreBuilder<C> {
    pub fn new(project: impl Into<String>, connector: C) -> Self {
        Self {
            project: project.into(),
            collection: None,
            marshaler: Arc::new(Identity),
            unmarshaler: Arc::new(Identity),
            connector,
        }
    }

    /// Scopes the store to a single collection.
    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    /// Scopes the store to a collection when one is given.
    pub fn maybe_collection(mut self, collection: Option<String>) -> Self {
        self.collection = collection;
        self
    }

    /// Sets the hook applied to documents before they are written.
    pub fn marshaler(mut self, marshaler: impl Marshaler + 'static) -> Self {
        self.marshaler = Arc::new(marshaler);
        self
    }

    /// Sets the hook applied to documents after they are read.
    pub fn unmarshaler(mut self, unmarshaler: impl UnMarshaler + 'static) -> Self {
        self.unmarshaler = Arc::new(unmarshaler);
        self
    }

    /// Builds the store. No connection is made until the first operation.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Configuration`] if the project identity is empty
    /// or the collection name is invalid.
    pub fn build(self) -> StoreResult<DocumentStore<C>> {
        if self.project.trim().is_empty() {
            return Err(StoreError::Configuration("missing project name".into()));
        }

        let scope = match self.collection {
            Some(collection) => Scope::collection(collection)?,
            None => Scope::unscoped(),
        };

        Ok(DocumentStore {
            project: self.project,
            scope,
            marshaler: self.marshaler,
            unmarshaler: self.unmarshaler,
            connector: self.connector,
            connection: RwLock::new(None),
        })
    }
}
