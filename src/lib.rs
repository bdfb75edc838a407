//! pg-mongo-sync library
//!
//! Copies the rows of a PostgreSQL table into a MongoDB collection,
//! re-shaping each positional row `(msisdn, name, gender, address, age)`
//! into a subscriber document.
//!
//! # Features
//!
//! - Full-table copy: one pass, fetch-all then write, fail-fast
//! - Validated, quoted table identifiers in the source query
//! - Configurable batch size (default: one insert per row)
//! - Id strategies: short random fragment, full UUID, or derived from the source key
//! - Upsert write mode for idempotent reruns with source-derived ids
//!
//! # Store Crates
//!
//! - `pg_mongo_sync_postgresql` - PostgreSQL source handle
//! - `pg_mongo_sync_mongodb` - MongoDB target handle
//! - `sync_core` - Row/document types, transform and store traits
//!
//! # CLI Usage
//!
//! ```bash
//! # Copy "subscribers" into the "subscribers" collection, one insert per row
//! pg-mongo-sync --pg-host localhost --pg-database postgres \
//!   --mongo-uri mongodb://localhost:27017/ --mongo-database DB \
//!   --source-table subscribers --target-collection subscribers
//!
//! # Idempotent rerun in batches of 500
//! pg-mongo-sync --id-strategy source-key --write-mode upsert --batch-size 500 ...
//! ```

use anyhow::Context;
use std::time::Duration;
use tracing::info;

pub mod config;
pub mod error;
pub mod migrator;
pub mod testing;

pub use config::{MigrateOpts, SourceOpts, TargetOpts, WriteMode};
pub use error::{MigrationError, StoreError};
pub use migrator::{MigrationReport, Migrator};

// Re-export store crates for convenience
pub use pg_mongo_sync_mongodb as mongodb;
pub use pg_mongo_sync_postgresql as postgresql;

use pg_mongo_sync_mongodb::MongoTarget;
use pg_mongo_sync_postgresql::PostgresSource;

/// Connect to both stores, run one migration pass and close both handles.
///
/// Both handles are closed whether or not the pass succeeded. Closing does
/// not undo documents already written.
pub async fn run_migration(
    source_opts: &SourceOpts,
    target_opts: &TargetOpts,
    source_table: &str,
    target_collection: &str,
    migrate_opts: MigrateOpts,
    connect_timeout: Option<Duration>,
) -> anyhow::Result<MigrationReport> {
    info!("Starting PostgreSQL migration to MongoDB");

    let mut source = PostgresSource::new(source_opts.connection_params(connect_timeout));
    let mut target = MongoTarget::new(&target_opts.mongo_uri, &target_opts.mongo_database);
    if let Some(timeout) = connect_timeout {
        target = target.with_connect_timeout(timeout);
    }

    let result = connect_and_migrate(
        &mut source,
        &mut target,
        source_table,
        target_collection,
        migrate_opts,
    )
    .await;

    source.close();
    target.close().await;

    result
}

async fn connect_and_migrate(
    source: &mut PostgresSource,
    target: &mut MongoTarget,
    source_table: &str,
    target_collection: &str,
    migrate_opts: MigrateOpts,
) -> anyhow::Result<MigrationReport> {
    source
        .connect()
        .await
        .context("Failed to open source connection")?;
    target
        .connect()
        .await
        .context("Failed to open target connection")?;

    info!("Connected to both PostgreSQL and MongoDB");

    let report = Migrator::new(&*source, &*target)
        .with_opts(migrate_opts)
        .migrate(source_table, target_collection)
        .await?;

    Ok(report)
}
