//! MongoDB backend implementation for stored.
//!
//! This crate provides a MongoDB-based implementation of the `StoreBackend`
//! port. The store's project identity names the MongoDB database; collections
//! and documents map one to one.
//!
//! To use this backend, include the `mongodb` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! stored = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Connection
//!
//! A [`MongoDbConnector`] holds the connection string or driver options. The
//! client is created lazily on the first store operation, so building a store
//! never touches the network.
//!
//! # Example
//!
//! ```ignore
//! use stored::{prelude::*, mongodb::MongoDbConnector};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = MongoDbConnector::new("mongodb://localhost:27017")
//!         .store_builder("my_database")
//!         .collection("testing")
//!         .build()?;
//!
//!     let ids = store.list().await?;
//!     store.close().await;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as stored_mongodb;

pub mod store;
mod sanitizer;

pub use store::{MongoDbBackend, MongoDbConnector, MongoDbStore};
