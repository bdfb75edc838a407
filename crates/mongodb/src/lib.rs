//! MongoDB target for pg-mongo-sync
//!
//! Provides [`MongoTarget`], a handle owning one client bound to a database,
//! and the conversion from [`sync_core::SubscriberDocument`] to BSON.

mod convert;
mod error;
mod target;

pub use convert::{source_value_to_bson, subscriber_to_document};
pub use error::MongoTargetError;
pub use target::{validate_collection_name, MongoTarget};
