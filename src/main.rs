//! Command-line interface for pg-mongo-sync
//!
//! # Usage Examples
//!
//! ```bash
//! # Copy the subscribers table using the built-in defaults
//! # (localhost PostgreSQL "postgres" database into MongoDB database "DB")
//! pg-mongo-sync
//!
//! # Explicit endpoints, schema-qualified table, batches of 500
//! pg-mongo-sync \
//!   --pg-host db.internal --pg-database crm --pg-user migrator \
//!   --mongo-uri mongodb://mongo.internal:27017/ --mongo-database crm \
//!   --source-table billing.subscribers --target-collection subscribers \
//!   --batch-size 500
//!
//! # Idempotent rerun: ids derived from msisdn, replace-by-id writes
//! pg-mongo-sync --id-strategy source-key --write-mode upsert
//! ```
//!
//! Every flag can also be set through the environment variable shown in
//! `--help` (e.g. `PG_PASSWORD`, `MONGODB_URI`).

use clap::Parser;
use pg_mongo_sync::config::parse_duration;
use pg_mongo_sync::{run_migration, MigrateOpts, MigrationError, SourceOpts, TargetOpts};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "pg-mongo-sync")]
#[command(about = "Copy the rows of a PostgreSQL table into a MongoDB collection")]
#[command(long_about = None)]
struct Cli {
    /// Source PostgreSQL connection options
    #[command(flatten)]
    source: SourceOpts,

    /// Target MongoDB connection options
    #[command(flatten)]
    target: TargetOpts,

    /// Source table (`table` or `schema.table`, folded to lower case like unquoted SQL names)
    #[arg(long, default_value = "subscribers", env = "SOURCE_TABLE")]
    source_table: String,

    /// Target collection
    #[arg(long, default_value = "subscribers", env = "TARGET_COLLECTION")]
    target_collection: String,

    /// Migration options
    #[command(flatten)]
    migrate: MigrateOpts,

    /// Timeout for connecting to either store (e.g. "10s", "1m"; "0" waits indefinitely)
    #[arg(long, default_value = "10s", value_parser = parse_timeout)]
    connect_timeout: Duration,
}

fn parse_timeout(s: &str) -> Result<Duration, String> {
    parse_duration(s).map_err(|e| format!("{e:#}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        if let Some(migration_error) = e.downcast_ref::<MigrationError>() {
            if migration_error.is_partial() {
                eprintln!(
                    "Note: {} documents were written before the failure and remain in the target",
                    migration_error.documents_written()
                );
            }
        }
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let connect_timeout = (!cli.connect_timeout.is_zero()).then_some(cli.connect_timeout);
    let dry_run = cli.migrate.dry_run;

    let report = run_migration(
        &cli.source,
        &cli.target,
        &cli.source_table,
        &cli.target_collection,
        cli.migrate,
        connect_timeout,
    )
    .await?;

    if dry_run {
        println!(
            "Dry run: {} rows read from {}, nothing written to {}",
            report.rows_read, cli.source_table, cli.target_collection
        );
    } else {
        println!(
            "Migrated {} of {} rows from {} into {} ({} writes, {:.2} docs/sec)",
            report.documents_written,
            report.rows_read,
            cli.source_table,
            cli.target_collection,
            report.writes,
            report.documents_per_second()
        );
    }

    Ok(())
}
