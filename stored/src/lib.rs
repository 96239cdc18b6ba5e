//! Main stored crate providing a unified interface for document storage.
//!
//! This crate is the primary entry point for users of stored. It re-exports the
//! core types from the sub-crates and provides access to the storage backends.
//!
//! # Features
//!
//! - **Backend-agnostic contract** - Program against [`Store`](store::Store), not a database client
//! - **Collection scoping** - Work inside one collection with relative ids, or across all of them
//! - **Pluggable marshaling** - Convert documents at the store boundary with your own hooks
//! - **Multiple backends** - In-memory and MongoDB storage behind one small port
//!
//! # Quick Start
//!
//! ```ignore
//! use stored::{prelude::*, memory::InMemoryConnector};
//! use bson::doc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = InMemoryConnector::new()
//!         .store_builder("my-project")
//!         .collection("testing")
//!         .build()
//!         .unwrap();
//!
//!     store.store_item(&Id::from("test1"), doc! { "foo": "bar" }.into()).await.unwrap();
//!
//!     let doc = store.retrieve(&Id::from("test1")).await.unwrap();
//!     println!("Retrieved: {doc}");
//!
//!     store.apply(&mut |id: Id, doc: Storable| {
//!         println!("{id} => {doc}");
//!         Ok(())
//!     }).await.unwrap();
//!
//!     store.close().await;
//! }
//! ```
//!
//! # Typed documents
//!
//! Hooks turn the store into a typed one without changing the contract:
//!
//! ```ignore
//! use stored::{prelude::*, document::{to_storable, from_storable}};
//!
//! let store = InMemoryConnector::new()
//!     .store_builder("my-project")
//!     .marshaler(|doc: Storable| -> StoreResult<bson::Bson> {
//!         let user: User = from_storable(doc)?;
//!         to_storable(&user.validated()?)
//!     })
//!     .build()?;
//! ```
//!
//! # Backends
//!
//! - [`memory`] - Fast in-memory storage for development and testing
//! - [`mongodb`] - Persistent MongoDB backend (requires `mongodb` feature)

pub mod prelude;

pub use stored_core::{backend, document, error, id, store};

// Re-export BSON types for convenience
pub use bson;

/// In-memory storage backend implementations.
pub mod memory {
    pub use stored_memory::{InMemoryBackend, InMemoryConnector, InMemoryStore};
}

/// MongoDB storage backend implementations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use stored_mongodb::{MongoDbBackend, MongoDbConnector, MongoDbStore};
}
