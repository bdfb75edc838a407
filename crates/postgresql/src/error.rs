//! Error types for the PostgreSQL source.

use thiserror::Error;

/// Errors that can occur while reading from PostgreSQL.
#[derive(Error, Debug)]
pub enum PostgresSourceError {
    /// The server could not be reached or rejected the credentials.
    #[error("Failed to connect to PostgreSQL: {0}")]
    Connection(#[source] tokio_postgres::Error),

    /// An operation was attempted before `connect` or after `close`.
    #[error("PostgreSQL source is not connected")]
    NotConnected,

    /// The table name is not a plain (optionally schema-qualified) identifier.
    #[error("Invalid table name '{name}': {reason}")]
    InvalidTableName { name: String, reason: &'static str },

    /// PostgreSQL query error.
    #[error("PostgreSQL error: {0}")]
    PostgreSQL(#[from] tokio_postgres::Error),

    /// A column value could not be read as its declared type.
    #[error("Failed to read column '{column}': {source}")]
    Column {
        column: String,
        #[source]
        source: tokio_postgres::Error,
    },

    /// A column type with no known mapping that cannot be read as text.
    #[error("Unsupported PostgreSQL type {type_name} in column '{column}'")]
    UnsupportedType { column: String, type_name: String },
}
