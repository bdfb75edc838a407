//! In-memory source and sink for exercising the migrator without databases.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use sync_core::{DocumentSink, RowSource, SourceRow, SubscriberDocument};
use thiserror::Error;

/// Error returned by the in-memory stores.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct MemoryStoreError {
    pub message: String,
    /// Documents of the failing call that were stored before the failure.
    pub persisted: u64,
}

impl MemoryStoreError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            persisted: 0,
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Tables of positional rows held in memory.
#[derive(Debug, Default)]
pub struct MemorySource {
    tables: HashMap<String, Vec<SourceRow>>,
    failure: Option<String>,
    fetches: Mutex<Vec<String>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table with the given rows.
    pub fn with_table(mut self, name: impl Into<String>, rows: Vec<SourceRow>) -> Self {
        self.tables.insert(name.into(), rows);
        self
    }

    /// Make every fetch fail with `message`.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Tables fetched so far, in call order.
    pub fn fetches(&self) -> Vec<String> {
        lock(&self.fetches).clone()
    }
}

#[async_trait]
impl RowSource for MemorySource {
    type Error = MemoryStoreError;

    async fn fetch_all(&self, table: &str) -> Result<Vec<SourceRow>, Self::Error> {
        lock(&self.fetches).push(table.to_string());
        if let Some(message) = &self.failure {
            return Err(MemoryStoreError::new(message.clone()));
        }
        self.tables
            .get(table)
            .cloned()
            .ok_or_else(|| MemoryStoreError::new(format!("relation \"{table}\" does not exist")))
    }
}

/// A write issued against a [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCall {
    InsertOne { collection: String, id: String },
    InsertMany { collection: String, count: usize },
    UpsertOne { collection: String, id: String },
}

/// Collections of documents held in memory.
///
/// Optionally fails when asked to store its k-th document (1-based, counted
/// across all calls); documents before it are kept.
#[derive(Debug, Default)]
pub struct MemorySink {
    collections: Mutex<HashMap<String, Vec<SubscriberDocument>>>,
    calls: Mutex<Vec<SinkCall>>,
    attempts: Mutex<u64>,
    fail_at: Option<u64>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail when the `k`-th document (1-based) is written.
    pub fn failing_at(mut self, k: u64) -> Self {
        self.fail_at = Some(k);
        self
    }

    /// Documents stored in a collection, in write order.
    pub fn documents(&self, collection: &str) -> Vec<SubscriberDocument> {
        lock(&self.collections)
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of documents stored in a collection.
    pub fn count(&self, collection: &str) -> usize {
        lock(&self.collections)
            .get(collection)
            .map_or(0, Vec::len)
    }

    /// Writes issued so far, in call order.
    pub fn calls(&self) -> Vec<SinkCall> {
        lock(&self.calls).clone()
    }

    /// Count an attempted document write, failing if it is the configured one.
    fn attempt(&self) -> Result<(), MemoryStoreError> {
        let mut attempts = lock(&self.attempts);
        *attempts += 1;
        if self.fail_at == Some(*attempts) {
            return Err(MemoryStoreError::new(format!(
                "write of document {} rejected",
                *attempts
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentSink for MemorySink {
    type Error = MemoryStoreError;

    async fn insert_one(
        &self,
        collection: &str,
        document: &SubscriberDocument,
    ) -> Result<(), Self::Error> {
        lock(&self.calls).push(SinkCall::InsertOne {
            collection: collection.to_string(),
            id: document.id.clone(),
        });
        self.attempt()?;
        lock(&self.collections)
            .entry(collection.to_string())
            .or_default()
            .push(document.clone());
        Ok(())
    }

    async fn insert_many(
        &self,
        collection: &str,
        documents: &[SubscriberDocument],
    ) -> Result<u64, Self::Error> {
        lock(&self.calls).push(SinkCall::InsertMany {
            collection: collection.to_string(),
            count: documents.len(),
        });

        let mut inserted = 0;
        for document in documents {
            if let Err(mut e) = self.attempt() {
                e.persisted = inserted;
                return Err(e);
            }
            lock(&self.collections)
                .entry(collection.to_string())
                .or_default()
                .push(document.clone());
            inserted += 1;
        }
        Ok(inserted)
    }

    async fn upsert_one(
        &self,
        collection: &str,
        document: &SubscriberDocument,
    ) -> Result<(), Self::Error> {
        lock(&self.calls).push(SinkCall::UpsertOne {
            collection: collection.to_string(),
            id: document.id.clone(),
        });
        self.attempt()?;

        let mut collections = lock(&self.collections);
        let stored = collections.entry(collection.to_string()).or_default();
        match stored.iter_mut().find(|existing| existing.id == document.id) {
            Some(existing) => *existing = document.clone(),
            None => stored.push(document.clone()),
        }
        Ok(())
    }

    fn persisted_before_failure(error: &Self::Error) -> u64 {
        error.persisted
    }
}
