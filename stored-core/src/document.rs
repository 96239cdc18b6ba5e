//! Document payloads and the marshal/unmarshal boundary.
//!
//! A [`Storable`] is a tree of JSON-compatible values. Stores pass it through a
//! [`Marshaler`] before every write and an [`UnMarshaler`] after every read.
//! Both default to [`Identity`], so raw backend values can be used directly.
//!
//! Any `Fn(Storable) -> StoreResult<Bson>` closure is a marshaler and any
//! `Fn(Bson) -> StoreResult<Storable>` closure is an unmarshaler:
//!
//! ```ignore
//! use stored_core::document::Storable;
//!
//! let stamp = |doc: Storable| {
//!     let mut doc = doc.as_document().cloned().unwrap_or_default();
//!     doc.insert("version", 1);
//!     Ok(doc.into())
//! };
//! ```

use bson::{Bson, de::deserialize_from_bson, ser::serialize_to_bson};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::error::StoreResult;

/// Opaque document payload.
pub type Storable = Bson;

/// Converts a document into the backend representation before it is written.
pub trait Marshaler: Send + Sync {
    fn marshal(&self, doc: Storable) -> StoreResult<Bson>;
}

/// Reconstitutes a document from the backend representation after it is read.
pub trait UnMarshaler: Send + Sync {
    fn unmarshal(&self, raw: Bson) -> StoreResult<Storable>;
}

/// Pass-through hook used when no marshaler or unmarshaler is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Marshaler for Identity {
    fn marshal(&self, doc: Storable) -> StoreResult<Bson> {
        Ok(doc)
    }
}

impl UnMarshaler for Identity {
    fn unmarshal(&self, raw: Bson) -> StoreResult<Storable> {
        Ok(raw)
    }
}

impl<F> Marshaler for F
where
    F: Fn(Storable) -> StoreResult<Bson> + Send + Sync,
{
    fn marshal(&self, doc: Storable) -> StoreResult<Bson> {
        self(doc)
    }
}

impl<F> UnMarshaler for F
where
    F: Fn(Bson) -> StoreResult<Storable> + Send + Sync,
{
    fn unmarshal(&self, raw: Bson) -> StoreResult<Storable> {
        self(raw)
    }
}

/// Serializes any serde type into a document payload.
///
/// # Errors
///
/// Returns [`StoreError::Serialization`](crate::error::StoreError::Serialization) if the value cannot be represented as BSON.
pub fn to_storable<T: Serialize>(value: &T) -> StoreResult<Storable> {
    Ok(serialize_to_bson(value)?)
}

/// Deserializes a document payload into any serde type.
///
/// # Errors
///
/// Returns [`StoreError::Serialization`](crate::error::StoreError::Serialization) if the payload does not match `T`.
pub fn from_storable<T: DeserializeOwned>(doc: Storable) -> StoreResult<T> {
    Ok(deserialize_from_bson(doc)?)
}

/// Converts a JSON value into a document payload.
///
/// # Errors
///
/// Returns [`StoreError::Serialization`](crate::error::StoreError::Serialization) for numbers BSON cannot hold.
pub fn from_json(value: &Value) -> StoreResult<Storable> {
    Ok(serialize_to_bson(value)?)
}

/// Renders a document payload as JSON.
///
/// # Errors
///
/// Returns [`StoreError::Serialization`](crate::error::StoreError::Serialization) if the payload holds a value JSON cannot express.
pub fn to_json(doc: &Storable) -> StoreResult<Value> {
    Ok(serde_json::to_value(doc)?)
}
