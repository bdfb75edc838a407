//! Error types for the MongoDB target.

use thiserror::Error;

/// Errors that can occur while writing to MongoDB.
#[derive(Error, Debug)]
pub enum MongoTargetError {
    /// The connection string is invalid, the server is unreachable or auth failed.
    #[error("Failed to connect to MongoDB: {0}")]
    Connection(#[source] mongodb::error::Error),

    /// An operation was attempted before `connect` or after `close`.
    #[error("MongoDB target is not connected")]
    NotConnected,

    /// The collection name cannot be used for writes.
    #[error("Invalid collection name '{name}': {reason}")]
    InvalidCollectionName { name: String, reason: &'static str },

    /// A field value could not be encoded as BSON.
    #[error("Failed to encode field '{field}' as BSON: {source}")]
    Encode {
        field: &'static str,
        #[source]
        source: bson::ser::Error,
    },

    /// An ordered bulk insert stopped part way; `persisted` documents were written.
    #[error("MongoDB bulk insert failed after {persisted} documents: {source}")]
    BulkInsert {
        persisted: u64,
        #[source]
        source: mongodb::error::Error,
    },

    /// MongoDB write or command error.
    #[error("MongoDB error: {0}")]
    MongoDB(#[from] mongodb::error::Error),
}
