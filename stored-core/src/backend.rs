//! Storage backend abstraction for document stores.
//!
//! This module defines the narrow port a remote document database has to provide
//! so that a [`DocumentStore`](crate::store::DocumentStore) can run on top of it.
//! The port only knows about collections and the documents inside them; id
//! scoping, marshaling and bulk traversal live in the store.
//!
//! # Traits
//!
//! - [`StoreBackend`]: A connected backend handle
//! - [`BackendConnector`]: Factory trait that establishes backend handles
//!
//! # Examples
//!
//! ```ignore
//! use stored_core::backend::{BackendConnector, StoreBackend};
//! use bson::{Bson, doc};
//!
//! let backend = connector.connect("my-project").await?;
//!
//! backend.set_document("users", "alice", Bson::Document(doc! { "age": 30 })).await?;
//! let ids = backend.list_document_ids("users").await?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use async_trait::async_trait;
use bson::Bson;
use std::{fmt::Debug, sync::Arc};

use crate::error::StoreResult;

/// A connected handle to a collection/document oriented database.
///
/// # Thread Safety
///
/// Stores share one handle between concurrent callers through an `Arc`, so
/// implementations must tolerate concurrent calls. Implementers should document
/// their concurrency model.
///
/// # Error Handling
///
/// Backends wrap their native failures in
/// [`StoreError::Backend`](crate::error::StoreError::Backend) and never retry.
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Creates or replaces the document `document` in `collection`.
    ///
    /// The collection is created implicitly if it doesn't exist.
    ///
    /// # Arguments
    ///
    /// * `collection` - The name of the collection to write into
    /// * `document` - The id of the document within the collection
    /// * `value` - The marshaled document, expected to be a `Bson::Document`
    async fn set_document(&self, collection: &str, document: &str, value: Bson) -> StoreResult<()>;

    /// Fetches a single document.
    ///
    /// # Returns
    ///
    /// Returns `Ok(None)` if no such document exists.
    async fn get_document(&self, collection: &str, document: &str) -> StoreResult<Option<Bson>>;

    /// Removes a single document.
    ///
    /// Removing a document that does not exist is not an error.
    async fn delete_document(&self, collection: &str, document: &str) -> StoreResult<()>;

    /// Lists the names of all collections that currently hold documents.
    async fn list_collections(&self) -> StoreResult<Vec<String>>;

    /// Lists the ids of all documents in a collection.
    ///
    /// A collection that does not exist yields an empty list. Order is
    /// backend-defined.
    async fn list_document_ids(&self, collection: &str) -> StoreResult<Vec<String>>;

    /// Releases the connection.
    ///
    /// The default implementation is a no-op.
    async fn close(&self) {}
}

#[async_trait]
impl<B> StoreBackend for &B
where
    B: StoreBackend,
{
    async fn set_document(&self, collection: &str, document: &str, value: Bson) -> StoreResult<()> {
        (*self)
            .set_document(collection, document, value)
            .await
    }

    async fn get_document(&self, collection: &str, document: &str) -> StoreResult<Option<Bson>> {
        (*self)
            .get_document(collection, document)
            .await
    }

    async fn delete_document(&self, collection: &str, document: &str) -> StoreResult<()> {
        (*self)
            .delete_document(collection, document)
            .await
    }

    async fn list_collections(&self) -> StoreResult<Vec<String>> {
        (*self).list_collections().await
    }

    async fn list_document_ids(&self, collection: &str) -> StoreResult<Vec<String>> {
        (*self)
            .list_document_ids(collection)
            .await
    }

    async fn close(&self) {
        (*self).close().await
    }
}

#[async_trait]
impl<B> StoreBackend for Arc<B>
where
    B: StoreBackend,
{
    async fn set_document(&self, collection: &str, document: &str, value: Bson) -> StoreResult<()> {
        (**self)
            .set_document(collection, document, value)
            .await
    }

    async fn get_document(&self, collection: &str, document: &str) -> StoreResult<Option<Bson>> {
        (**self)
            .get_document(collection, document)
            .await
    }

    async fn delete_document(&self, collection: &str, document: &str) -> StoreResult<()> {
        (**self)
            .delete_document(collection, document)
            .await
    }

    async fn list_collections(&self) -> StoreResult<Vec<String>> {
        (**self).list_collections().await
    }

    async fn list_document_ids(&self, collection: &str) -> StoreResult<Vec<String>> {
        (**self)
            .list_document_ids(collection)
            .await
    }

    async fn close(&self) {
        (**self).close().await
    }
}

/// Factory for backend handles.
///
/// A connector owns everything needed to reach the backend except the project
/// identity, which the store passes in. Unlike a one-shot builder it can be
/// asked again after a failed attempt.
#[async_trait]
pub trait BackendConnector: Send + Sync {
    type Backend: StoreBackend + 'static;

    /// Establishes a new backend handle for `project`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Connection`](crate::error::StoreError::Connection)
    /// if the client cannot be constructed.
    async fn connect(&self, project: &str) -> StoreResult<Self::Backend>;
}

#[async_trait]
impl<C> BackendConnector for Arc<C>
where
    C: BackendConnector,
{
    type Backend = C::Backend;

    async fn connect(&self, project: &str) -> StoreResult<Self::Backend> {
        (**self).connect(project).await
    }
}
