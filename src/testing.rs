//! Test infrastructure
//!
//! In-memory stores for exercising the migrator without databases, plus
//! helpers shared by the live PostgreSQL/MongoDB tests.

pub mod memory;
pub mod test_helpers;

pub use memory::{MemorySink, MemorySource, MemoryStoreError, SinkCall};
pub use test_helpers::{
    generate_test_id, init_logging, subscriber_row, subscriber_rows, TestConfig,
};
