//! MongoDB target handle.

use crate::convert::subscriber_to_document;
use crate::error::MongoTargetError;
use async_trait::async_trait;
use bson::{doc, Document};
use mongodb::error::ErrorKind;
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection, Database};
use std::time::Duration;
use sync_core::{DocumentSink, SubscriberDocument};
use tracing::{debug, info, trace};

/// Check that a collection name can be written to.
pub fn validate_collection_name(name: &str) -> Result<(), MongoTargetError> {
    let reason = if name.is_empty() {
        "collection name is empty"
    } else if name.contains('$') {
        "collection name may not contain '$'"
    } else if name.contains('\0') {
        "collection name may not contain NUL"
    } else if name.starts_with("system.") {
        "the 'system.' prefix is reserved"
    } else {
        return Ok(());
    };

    Err(MongoTargetError::InvalidCollectionName {
        name: name.to_string(),
        reason,
    })
}

/// Owns a single MongoDB client bound to one database.
///
/// Constructing the handle does no I/O; [`connect`](Self::connect) builds the
/// client and pings the server, [`close`](Self::close) shuts it down.
pub struct MongoTarget {
    connection_string: String,
    database_name: String,
    connect_timeout: Option<Duration>,
    client: Option<Client>,
    database: Option<Database>,
}

impl MongoTarget {
    /// Create a new, unconnected target handle.
    pub fn new(connection_string: impl Into<String>, database_name: impl Into<String>) -> Self {
        Self {
            connection_string: connection_string.into(),
            database_name: database_name.into(),
            connect_timeout: None,
            client: None,
            database: None,
        }
    }

    /// Set the connect and server selection timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Name of the database documents are written to.
    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    /// Whether [`connect`](Self::connect) has succeeded and the handle is not closed.
    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    /// Build the client, bind the database and ping the server. No retry.
    pub async fn connect(&mut self) -> Result<(), MongoTargetError> {
        let mut options = ClientOptions::parse(&self.connection_string)
            .await
            .map_err(MongoTargetError::Connection)?;
        if let Some(timeout) = self.connect_timeout {
            options.connect_timeout = Some(timeout);
            options.server_selection_timeout = Some(timeout);
        }
        debug!("MongoDB options parsed successfully");

        let client = Client::with_options(options).map_err(MongoTargetError::Connection)?;
        let database = client.database(&self.database_name);

        // The driver connects lazily; ping so unreachable servers fail here.
        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(MongoTargetError::Connection)?;

        info!("Connected to MongoDB database '{}'", self.database_name);
        self.client = Some(client);
        self.database = Some(database);
        Ok(())
    }

    /// Resolve a collection. No I/O; MongoDB creates it on first write.
    pub fn collection(&self, name: &str) -> Result<Collection<Document>, MongoTargetError> {
        validate_collection_name(name)?;
        let database = self
            .database
            .as_ref()
            .ok_or(MongoTargetError::NotConnected)?;
        Ok(database.collection(name))
    }

    /// Insert a single document.
    pub async fn insert_one(
        &self,
        collection_name: &str,
        document: &SubscriberDocument,
    ) -> Result<(), MongoTargetError> {
        let collection = self.collection(collection_name)?;
        let doc = subscriber_to_document(document)?;
        collection.insert_one(doc).await?;
        trace!("Inserted document {} into {}", document.id, collection_name);
        Ok(())
    }

    /// Insert documents with an ordered bulk insert.
    pub async fn insert_many(
        &self,
        collection_name: &str,
        documents: &[SubscriberDocument],
    ) -> Result<u64, MongoTargetError> {
        if documents.is_empty() {
            return Ok(0);
        }

        let collection = self.collection(collection_name)?;
        let docs = documents
            .iter()
            .map(subscriber_to_document)
            .collect::<Result<Vec<_>, _>>()?;

        let result = collection.insert_many(docs).await.map_err(|source| {
            match bulk_insert_persisted(&source, documents.len()) {
                Some(persisted) => MongoTargetError::BulkInsert { persisted, source },
                None => MongoTargetError::MongoDB(source),
            }
        })?;
        trace!(
            "Inserted {} documents into {}",
            result.inserted_ids.len(),
            collection_name
        );
        Ok(result.inserted_ids.len() as u64)
    }

    /// Replace the document whose `id` matches, inserting it if absent.
    pub async fn upsert_one(
        &self,
        collection_name: &str,
        document: &SubscriberDocument,
    ) -> Result<(), MongoTargetError> {
        let collection = self.collection(collection_name)?;
        let doc = subscriber_to_document(document)?;
        collection
            .replace_one(doc! { "id": document.id.as_str() }, doc)
            .upsert(true)
            .await?;
        trace!("Upserted document {} into {}", document.id, collection_name);
        Ok(())
    }

    /// Count the documents in a collection.
    pub async fn count_documents(&self, collection_name: &str) -> Result<u64, MongoTargetError> {
        let collection = self.collection(collection_name)?;
        let count = collection.count_documents(doc! {}).await?;
        Ok(count)
    }

    /// Shut the client down if one is open. Safe to call repeatedly or before `connect`.
    pub async fn close(&mut self) {
        self.database = None;
        if let Some(client) = self.client.take() {
            debug!("Closing MongoDB client");
            client.shutdown().await;
        }
    }
}

/// Documents persisted by a failed ordered bulk insert of `attempted` documents.
///
/// `None` when the failure is not a bulk write failure.
fn bulk_insert_persisted(error: &mongodb::error::Error, attempted: usize) -> Option<u64> {
    match error.kind.as_ref() {
        ErrorKind::InsertMany(failure) => Some(ordered_insert_persisted(
            failure
                .write_errors
                .as_ref()
                .and_then(|errors| errors.iter().map(|e| e.index).min()),
            attempted,
        )),
        _ => None,
    }
}

/// An ordered insert stops at its first write error, so everything before it
/// was written. Without a write error (only a write concern error) every
/// document reached the server.
fn ordered_insert_persisted(first_failed: Option<usize>, attempted: usize) -> u64 {
    first_failed.unwrap_or(attempted) as u64
}

#[async_trait]
impl DocumentSink for MongoTarget {
    type Error = MongoTargetError;

    async fn insert_one(
        &self,
        collection: &str,
        document: &SubscriberDocument,
    ) -> Result<(), Self::Error> {
        MongoTarget::insert_one(self, collection, document).await
    }

    async fn insert_many(
        &self,
        collection: &str,
        documents: &[SubscriberDocument],
    ) -> Result<u64, Self::Error> {
        MongoTarget::insert_many(self, collection, documents).await
    }

    async fn upsert_one(
        &self,
        collection: &str,
        document: &SubscriberDocument,
    ) -> Result<(), Self::Error> {
        MongoTarget::upsert_one(self, collection, document).await
    }

    fn persisted_before_failure(error: &Self::Error) -> u64 {
        match error {
            MongoTargetError::BulkInsert { persisted, .. } => *persisted,
            _ => 0,
        }
    }
}
