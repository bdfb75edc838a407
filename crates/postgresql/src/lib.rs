//! PostgreSQL source for pg-mongo-sync
//!
//! Provides [`PostgresSource`], a handle owning one connection that reads
//! whole tables as positional [`sync_core::SourceRow`]s. Table names are
//! validated and quoted through [`TableName`] before they reach SQL text.

mod error;
mod source;
mod table_name;
mod value;

pub use error::PostgresSourceError;
pub use source::{ConnectionParams, PostgresSource};
pub use table_name::{quote_identifier, TableName, MAX_IDENTIFIER_LEN};
pub use value::{convert_postgres_value, convert_row};
