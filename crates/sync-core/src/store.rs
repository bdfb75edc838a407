//! Store traits the migrator is written against.
//!
//! The PostgreSQL source and MongoDB target implement these; tests use
//! in-memory implementations.

use crate::document::SubscriberDocument;
use crate::values::SourceRow;
use async_trait::async_trait;

/// A relational store that can return every row of a table.
#[async_trait]
pub trait RowSource: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetch all rows of `table`, in the order the store returns them.
    async fn fetch_all(&self, table: &str) -> Result<Vec<SourceRow>, Self::Error>;
}

/// A document store that accepts subscriber documents.
#[async_trait]
pub trait DocumentSink: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Insert one document. One round trip per call.
    async fn insert_one(
        &self,
        collection: &str,
        document: &SubscriberDocument,
    ) -> Result<(), Self::Error>;

    /// Insert documents in order, returning how many were inserted.
    ///
    /// Stops at the first failing document; documents before it stay written.
    async fn insert_many(
        &self,
        collection: &str,
        documents: &[SubscriberDocument],
    ) -> Result<u64, Self::Error>;

    /// Replace the document with the same `id`, inserting it if absent.
    async fn upsert_one(
        &self,
        collection: &str,
        document: &SubscriberDocument,
    ) -> Result<(), Self::Error>;

    /// Documents of a failed [`insert_many`](Self::insert_many) call that were persisted anyway.
    fn persisted_before_failure(_error: &Self::Error) -> u64 {
        0
    }
}
