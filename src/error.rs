//! Error types for a migration pass.

use sync_core::TransformError;
use thiserror::Error;

/// Boxed cause from a source or target store.
pub type StoreError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that abort a migration pass.
///
/// Documents written before the failure stay in the target; `written`
/// reports how many there are.
#[derive(Error, Debug)]
pub enum MigrationError {
    /// Reading the source table failed; nothing was written.
    #[error("Migration failed: could not fetch rows from '{table}': {source}")]
    Fetch {
        table: String,
        #[source]
        source: StoreError,
    },

    /// A row did not match the positional contract.
    #[error(
        "Migration failed: row {row} could not be transformed ({written} documents already written): {source}"
    )]
    Transform {
        row: usize,
        written: u64,
        #[source]
        source: TransformError,
    },

    /// Writing to the target collection failed.
    #[error(
        "Migration failed: write into '{collection}' failed after {written} documents were written: {source}"
    )]
    Write {
        collection: String,
        written: u64,
        #[source]
        source: StoreError,
    },
}

impl MigrationError {
    /// Documents persisted in the target before the failure.
    pub fn documents_written(&self) -> u64 {
        match self {
            MigrationError::Fetch { .. } => 0,
            MigrationError::Transform { written, .. } | MigrationError::Write { written, .. } => {
                *written
            }
        }
    }

    /// Whether the target was left holding part of the table.
    pub fn is_partial(&self) -> bool {
        self.documents_written() > 0
    }
}
