//! A minimal document store abstraction that keeps callers independent of the
//! database client they run on.
//!
//! This crate is the core of the stored project and provides:
//!
//! - **Identifiers** ([`id`]) - Document ids, document paths and collection scoping
//! - **Documents** ([`document`]) - The document payload and the marshal/unmarshal hooks
//! - **Backend abstraction** ([`backend`]) - The narrow port a remote document database implements
//! - **Store** ([`store`]) - The `Store` contract and the generic adapter implementing it
//! - **Error handling** ([`error`]) - Error types and result types
//!
//! # Example
//!
//! ```ignore
//! use stored_core::{id::Id, store::{DocumentStore, Store}};
//! use bson::{Bson, doc};
//!
//! let store = DocumentStore::builder("my-project", connector)
//!     .collection("testing")
//!     .build()?;
//!
//! store.store_item(&Id::from("test1"), Bson::Document(doc! { "foo": "bar" })).await?;
//!
//! store.apply(&mut |id, doc| {
//!     println!("{id}: {doc}");
//!     Ok(())
//! }).await?;
//!
//! store.close().await;
//! ```

#[allow(unused_extern_crates)]
extern crate self as stored_core;

pub mod backend;
pub mod document;
pub mod error;
pub mod id;
pub mod store;
