//! Command-line and environment configuration.

pub mod duration;

use clap::{Args, ValueEnum};
use pg_mongo_sync_postgresql::ConnectionParams;
use std::time::Duration;
use sync_core::IdStrategy;

pub use duration::parse_duration;

/// PostgreSQL source connection options
#[derive(Args, Clone, Debug)]
pub struct SourceOpts {
    /// PostgreSQL host
    #[arg(long, default_value = "localhost", env = "PG_HOST")]
    pub pg_host: String,

    /// PostgreSQL port
    #[arg(long, default_value = "5432", env = "PG_PORT")]
    pub pg_port: u16,

    /// PostgreSQL database name
    #[arg(long, default_value = "postgres", env = "PG_DATABASE")]
    pub pg_database: String,

    /// PostgreSQL user
    #[arg(long, default_value = "postgres", env = "PG_USER")]
    pub pg_user: String,

    /// PostgreSQL password
    #[arg(long, default_value = "postgres", env = "PG_PASSWORD", hide_env_values = true)]
    pub pg_password: String,
}

impl SourceOpts {
    /// Connection parameters for the source handle.
    pub fn connection_params(&self, connect_timeout: Option<Duration>) -> ConnectionParams {
        ConnectionParams {
            host: self.pg_host.clone(),
            port: self.pg_port,
            database: self.pg_database.clone(),
            user: self.pg_user.clone(),
            password: self.pg_password.clone(),
            connect_timeout,
        }
    }
}

/// MongoDB target connection options
#[derive(Args, Clone, Debug)]
pub struct TargetOpts {
    /// MongoDB connection string
    #[arg(
        long,
        default_value = "mongodb://localhost:27017/",
        env = "MONGODB_URI",
        hide_env_values = true
    )]
    pub mongo_uri: String,

    /// MongoDB database name
    #[arg(long, default_value = "DB", env = "MONGODB_DATABASE")]
    pub mongo_database: String,
}

/// How documents are written to the target collection.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WriteMode {
    /// Blind insert; reruns add new documents
    #[default]
    Insert,
    /// Replace by `id`, inserting when absent
    Upsert,
}

/// Migration behavior options
#[derive(Args, Clone, Debug)]
pub struct MigrateOpts {
    /// Number of documents per write (1 = one insert per row)
    #[arg(long, default_value = "1", value_parser = clap::value_parser!(u64).range(1..))]
    pub batch_size: u64,

    /// Document id generation: short, uuid or source-key
    #[arg(long, default_value = "short", env = "ID_STRATEGY")]
    pub id_strategy: IdStrategy,

    /// Write mode for documents
    #[arg(long, value_enum, default_value = "insert")]
    pub write_mode: WriteMode,

    /// Dry run mode - read and transform, but don't write data
    #[arg(long)]
    pub dry_run: bool,
}

impl Default for MigrateOpts {
    fn default() -> Self {
        Self {
            batch_size: 1,
            id_strategy: IdStrategy::default(),
            write_mode: WriteMode::default(),
            dry_run: false,
        }
    }
}
