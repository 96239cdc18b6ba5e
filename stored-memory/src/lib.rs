//! In-memory document storage backend for stored.
//!
//! This crate provides a thread-safe, in-memory implementation of the
//! `StoreBackend` port. It is ideal for development, testing, and for running
//! the store contract without a live database.
//!
//! # Quick Start
//!
//! ```ignore
//! use stored_core::{id::Id, store::Store};
//! use stored_memory::InMemoryConnector;
//! use bson::{Bson, doc};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = InMemoryConnector::new()
//!         .store_builder("my-project")
//!         .collection("users")
//!         .build()?;
//!
//!     store.store_item(&Id::from("alice"), Bson::Document(doc! { "age": 30 })).await?;
//!     assert_eq!(store.list().await?, vec![Id::from("alice")]);
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as stored_memory;

pub mod store;

pub use store::{InMemoryBackend, InMemoryConnector};

/// A [`DocumentStore`](stored_core::store::DocumentStore) backed by memory.
pub type InMemoryStore = stored_core::store::DocumentStore<InMemoryConnector>;
