use async_trait::async_trait;
use bson::{Bson, Document, oid::ObjectId, doc};
use futures::TryStreamExt;
use mongodb::{
    Client, Collection as MongoCollection,
    options::{ClientOptions, FindOneOptions, FindOptions},
};
use std::fmt;
use tracing::debug;

use stored_core::{
    backend::{BackendConnector, StoreBackend},
    error::{StoreError, StoreResult},
    store::{DocumentStore, DocumentStoreBuilder},
};

use crate::sanitizer::NameSanitizer;

/// Reserved field holding the document id.
const ID_FIELD: &str = "_id";

/// A [`DocumentStore`] backed by MongoDB.
pub type MongoDbStore = DocumentStore<MongoDbConnector>;

/// Connected MongoDB handle bound to one database.
///
/// The project identity of the store names the database. The driver's client
/// is internally pooled and safe to share between concurrent callers.
#[derive(Debug, Clone)]
pub struct MongoDbBackend {
    client: Client,
    database: String,
}

impl MongoDbBackend {
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    fn get_collection(&self, collection_name: &str) -> MongoCollection<Document> {
        self.client
            .database(&self.database)
            .collection(&NameSanitizer::sanitize_string(collection_name))
    }

    /// Stored `_id` values a document id may refer to.
    ///
    /// Documents written through this backend carry a string `_id`. Documents
    /// created by other tools may use an ObjectId or an integer, which are
    /// listed by their hex or decimal form and matched here again.
    fn id_candidates(document: &str) -> Vec<Bson> {
        let mut candidates = vec![Bson::from(document)];

        if let Ok(oid) = ObjectId::parse_str(document) {
            candidates.push(Bson::ObjectId(oid));
        }

        // Only the canonical decimal form, so "05" stays a plain string.
        if let Some(n) = document.parse::<i64>().ok().filter(|n| n.to_string() == document) {
            candidates.push(match i32::try_from(n) {
                Ok(n) => Bson::Int32(n),
                Err(_) => Bson::Int64(n),
            });
        }

        candidates
    }

    fn id_filter(document: &str) -> Document {
        let mut candidates = Self::id_candidates(document);

        match candidates.len() {
            1 => doc! { ID_FIELD: candidates.remove(0) },
            _ => doc! { ID_FIELD: { "$in": candidates } },
        }
    }

    /// The `_id` a write targets: the one already stored for `document` if
    /// there is one, else the plain string.
    fn write_key(document: &str, existing: Option<&Bson>) -> Bson {
        existing.cloned().unwrap_or_else(|| Bson::from(document))
    }

    /// Renders a stored `_id` the way it is exposed as a document id.
    ///
    /// Returns `None` for `_id` types that [`id_filter`](Self::id_filter)
    /// could not match again.
    fn render_id(id: &Bson) -> Option<String> {
        match id {
            Bson::String(s) => Some(s.clone()),
            Bson::ObjectId(oid) => Some(oid.to_hex()),
            Bson::Int32(n) => Some(n.to_string()),
            Bson::Int64(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Field name a user `_id` is stored under, since `_id` holds the key.
    fn escaped_id_field() -> String {
        format!("{}{}", NameSanitizer::escape_char('_'), &ID_FIELD[1..])
    }

    fn prepare_document(key: &Bson, value: &Bson) -> StoreResult<Document> {
        let fields = value
            .as_document()
            .ok_or_else(|| StoreError::InvalidDocument(format!(
                "{key} must be a document, got {:?}",
                value.element_type()
            )))?;

        let mut prepared = doc! { ID_FIELD: key.clone() };
        for (name, field) in NameSanitizer::sanitize_document(fields) {
            let name = if name == ID_FIELD { Self::escaped_id_field() } else { name };
            prepared.insert(name, field);
        }

        Ok(prepared)
    }

    fn restore_document(document: &Document) -> Bson {
        Bson::Document(
            NameSanitizer::restore_document(&Document::from_iter(
                document
                    .clone()
                    .into_iter()
                    .filter(|(k, _)| k != ID_FIELD)
            ))
        )
    }
}

#[async_trait]
impl StoreBackend for MongoDbBackend {
    async fn set_document(&self, collection: &str, document: &str, value: Bson) -> StoreResult<()> {
        let target = self.get_collection(collection);

        // Overwrite a document stored under a non-string `_id` in place.
        let existing = match Self::id_candidates(document).len() {
            1 => None,
            _ => {
                let mut options = FindOneOptions::default();
                options.projection = Some(doc! { ID_FIELD: 1 });

                target
                    .find_one(Self::id_filter(document))
                    .with_options(options)
                    .await
                    .map_err(|e| StoreError::Backend(e.to_string()))?
            }
        };
        let key = Self::write_key(document, existing.as_ref().and_then(|doc| doc.get(ID_FIELD)));

        target
            .replace_one(
                doc! { ID_FIELD: key.clone() },
                Self::prepare_document(&key, &value)?,
            )
            .upsert(true)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(())
    }

    async fn get_document(&self, collection: &str, document: &str) -> StoreResult<Option<Bson>> {
        Ok(
            self.get_collection(collection)
                .find_one(Self::id_filter(document))
                .await
                .map_err(|e| StoreError::Backend(e.to_string()))?
                .map(|doc| Self::restore_document(&doc))
        )
    }

    async fn delete_document(&self, collection: &str, document: &str) -> StoreResult<()> {
        let result = self.get_collection(collection)
            .delete_one(Self::id_filter(document))
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        if result.deleted_count == 0 {
            debug!(collection, document, "delete of missing document ignored");
        }

        Ok(())
    }

    async fn list_collections(&self) -> StoreResult<Vec<String>> {
        Ok(
            self.client
                .database(&self.database)
                .list_collection_names()
                .await
                .map_err(|e| StoreError::Backend(e.to_string()))?
                .into_iter()
                .filter(|name| !name.starts_with("system."))
                .map(|name| NameSanitizer::restore_string(&name))
                .collect()
        )
    }

    async fn list_document_ids(&self, collection: &str) -> StoreResult<Vec<String>> {
        let mut options = FindOptions::default();
        options.projection = Some(doc! { ID_FIELD: 1 });

        Ok(
            self.get_collection(collection)
                .find(doc! {})
                .with_options(options)
                .await
                .map_err(|e| StoreError::Backend(e.to_string()))?
                .try_collect::<Vec<Document>>()
                .await
                .map_err(|e| StoreError::Backend(e.to_string()))?
                .iter()
                .filter_map(|doc| {
                    let id = doc.get(ID_FIELD)?;
                    let rendered = Self::render_id(id);
                    if rendered.is_none() {
                        debug!(collection, ?id, "skipping document with an unaddressable _id");
                    }
                    rendered
                })
                .collect()
        )
    }

    async fn close(&self) {
        self.client.clone().shutdown().await;
    }
}

enum ConnectionSource {
    Uri(String),
    Options(ClientOptions),
}

/// Builds MongoDB clients for stores.
///
/// Client construction only validates options; the driver reaches the server
/// on the first command. Credentials travel in the URI or the options and are
/// never inspected here.
pub struct MongoDbConnector {
    source: ConnectionSource,
}

impl MongoDbConnector {
    /// Connects using a `mongodb://` or `mongodb+srv://` connection string.
    pub fn new(uri: &str) -> Self {
        Self {
            source: ConnectionSource::Uri(uri.to_string()),
        }
    }

    /// Connects using fully prepared driver options.
    pub fn with_options(options: ClientOptions) -> Self {
        Self {
            source: ConnectionSource::Options(options),
        }
    }

    /// Creates a store builder for the database named `project`.
    pub fn store_builder(self, project: impl Into<String>) -> DocumentStoreBuilder<Self> {
        DocumentStore::builder(project, self)
    }
}

impl fmt::Debug for MongoDbConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match self.source {
            ConnectionSource::Uri(_) => "uri",
            ConnectionSource::Options(_) => "options",
        };

        f.debug_struct("MongoDbConnector")
            .field("source", &source)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl BackendConnector for MongoDbConnector {
    type Backend = MongoDbBackend;

    async fn connect(&self, project: &str) -> StoreResult<Self::Backend> {
        let options = match &self.source {
            ConnectionSource::Uri(uri) => ClientOptions::parse(uri)
                .await
                .map_err(|e| StoreError::Connection(e.to_string()))?,
            ConnectionSource::Options(options) => options.clone(),
        };

        Ok(MongoDbBackend::new(
            Client::with_options(options)
                .map_err(|e| StoreError::Connection(e.to_string()))?,
            project.to_string(),
        ))
    }
}
