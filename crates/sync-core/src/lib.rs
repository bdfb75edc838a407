//! Core types for pg-mongo-sync.
//!
//! This crate provides the types shared by the source, the target and the
//! migrator:
//!
//! - [`SourceValue`] / [`SourceRow`] - Positional rows read from the relational source
//! - [`SubscriberDocument`] - The fixed document shape written to the target
//! - [`transform_row`] / [`IdStrategy`] - Row to document mapping and id generation
//! - [`RowSource`] / [`DocumentSink`] - Store traits the migrator is generic over
//!
//! # Architecture
//!
//! ```text
//! sync-core (this crate)
//!    │
//!    ├─── pg-mongo-sync-postgresql  (implements RowSource)
//!    ├─── pg-mongo-sync-mongodb     (implements DocumentSink)
//!    └─── pg-mongo-sync             (Migrator, CLI)
//! ```
//!
//! # Example
//!
//! ```rust
//! use sync_core::{transform_row, IdStrategy, SourceRow, SourceValue};
//!
//! let row = SourceRow::new(vec![
//!     "15551234567".into(),
//!     "Jane Doe".into(),
//!     "F".into(),
//!     "123 Main St".into(),
//!     29.into(),
//! ]);
//!
//! let doc = transform_row(&row, IdStrategy::Short).unwrap();
//! assert_eq!(doc.id.len(), 8);
//! assert_eq!(doc.age, SourceValue::Int32(29));
//! ```

pub mod document;
pub mod store;
pub mod values;

// Re-exports for convenience
pub use document::{
    transform_row, IdStrategy, SubscriberDocument, TransformError, SOURCE_KEY_NAMESPACE,
    SUBSCRIBER_COLUMNS,
};
pub use store::{DocumentSink, RowSource};
pub use values::{SourceRow, SourceValue};
