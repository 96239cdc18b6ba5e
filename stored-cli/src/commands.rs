//! Command handlers.
//!
//! Handlers take any [`Store`] so they can run against the in-memory backend
//! in tests and MongoDB in the binary.

use std::io::Write;

use anyhow::{Context, Result, bail};
use serde_json::Value;
use stored::{
    document,
    prelude::{Id, Storable, Store, StoreError, StoreResult},
};

/// Writes the document at `id` to `out` as a single line of JSON.
pub async fn get(store: &dyn Store, id: &Id, out: &mut impl Write) -> Result<()> {
    let doc = store.retrieve(id).await?;

    writeln!(out, "{}", serde_json::to_string(&document::to_json(&doc)?)?)?;

    Ok(())
}

/// Stores the JSON object in `input` at `id`.
pub async fn set(store: &dyn Store, id: &Id, input: &str) -> Result<()> {
    let value: Value = serde_json::from_str(input).context("stdin is not valid JSON")?;

    if !value.is_object() {
        bail!("document must be a JSON object");
    }

    store.store_item(id, document::from_json(&value)?).await?;

    Ok(())
}

/// Deletes the document at `id`.
pub async fn del(store: &dyn Store, id: &Id) -> Result<()> {
    store.delete(id).await?;

    Ok(())
}

/// Writes every visible id, one per line.
pub async fn list(store: &dyn Store, out: &mut impl Write) -> Result<()> {
    for id in store.list().await? {
        writeln!(out, "{id}")?;
    }

    Ok(())
}

/// Writes every document as `id<TAB>json`, one per line.
pub async fn dump(store: &dyn Store, out: &mut (impl Write + Send)) -> Result<()> {
    store
        .apply(&mut |id: Id, doc: Storable| -> StoreResult<()> {
            let json = serde_json::to_string(&document::to_json(&doc)?)?;

            writeln!(out, "{id}\t{json}")
                .map_err(|e| StoreError::Handler(e.to_string()))
        })
        .await?;

    Ok(())
}
