//! Error types and result types for store operations.
//!
//! Every fallible operation in the workspace returns [`StoreResult<T>`]. Backend
//! failures are wrapped, never retried, and never swallowed.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

use crate::id::Id;

/// Represents all possible errors that can occur when interacting with a store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store was configured with a missing or invalid project identity or scope.
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// The backend client could not be constructed.
    ///
    /// The store stays unconnected and retries on the next operation.
    #[error("Connection error: {0}")]
    Connection(String),
    /// No document exists at the given id.
    #[error("Document not found: {0}")]
    NotFound(Id),
    /// The id cannot be mapped onto a `<collection>/<document>` path.
    #[error("Invalid id: {0}")]
    InvalidId(String),
    /// The marshaled value cannot be stored as a document.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
    /// A marshaler rejected the document before it was written.
    #[error("Marshal error: {0}")]
    Marshal(String),
    /// An unmarshaler rejected a document after it was read.
    #[error("Unmarshal error: {0}")]
    Unmarshal(String),
    /// Serialization/deserialization error when converting between BSON and JSON.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// An error occurred in the underlying storage backend.
    #[error("Backend error: {0}")]
    Backend(String),
    /// An `apply` handler aborted the traversal.
    #[error("Handler error: {0}")]
    Handler(String),
}

impl StoreError {
    /// Returns `true` when the error reports a missing document.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// A specialized `Result` type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl From<BsonError> for StoreError {
    fn from(err: BsonError) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for StoreError {
    fn from(err: SerdeJsonError) -> Self {
        StoreError::Serialization(err.to_string())
    }
}
