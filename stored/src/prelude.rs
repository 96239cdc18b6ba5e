//! Convenient re-exports of commonly used types from stored.
//!
//! ```ignore
//! use stored::prelude::*;
//! ```

pub use stored_core::{
    store::{Store, DocumentStore, DocumentStoreBuilder, ItemHandler},
    document::{Storable, Marshaler, UnMarshaler, Identity},
    backend::{StoreBackend, BackendConnector},
    id::{Id, Scope},
    error::{StoreError, StoreResult},
};

pub use stored_memory::InMemoryConnector;
