//! PostgreSQL source handle.

use crate::error::PostgresSourceError;
use crate::table_name::TableName;
use crate::value::convert_row;
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use sync_core::{RowSource, SourceRow};
use tokio::task::JoinHandle;
use tokio_postgres::{Client, NoTls};
use tracing::{debug, info};

/// Connection parameters for the source database.
#[derive(Clone)]
pub struct ConnectionParams {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    /// Timeout for establishing the connection (`None` waits indefinitely)
    pub connect_timeout: Option<Duration>,
}

impl ConnectionParams {
    fn to_config(&self) -> tokio_postgres::Config {
        let mut config = tokio_postgres::Config::new();
        config
            .host(&self.host)
            .port(self.port)
            .dbname(&self.database)
            .user(&self.user)
            .password(&self.password);
        if let Some(timeout) = self.connect_timeout {
            config.connect_timeout(timeout);
        }
        config
    }
}

impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

/// Owns a single connection to PostgreSQL and runs full-table reads.
///
/// Constructing the handle does no I/O; [`connect`](Self::connect) opens the
/// connection and [`close`](Self::close) releases it.
pub struct PostgresSource {
    params: ConnectionParams,
    client: Option<Client>,
    connection_task: Option<JoinHandle<()>>,
}

impl PostgresSource {
    /// Create a new, unconnected source handle.
    pub fn new(params: ConnectionParams) -> Self {
        Self {
            params,
            client: None,
            connection_task: None,
        }
    }

    /// Connection parameters this handle was built with.
    pub fn params(&self) -> &ConnectionParams {
        &self.params
    }

    /// Whether [`connect`](Self::connect) has succeeded and the handle is not closed.
    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    /// Open the connection. No retry.
    pub async fn connect(&mut self) -> Result<(), PostgresSourceError> {
        debug!(
            "Connecting to PostgreSQL at {}:{}/{}",
            self.params.host, self.params.port, self.params.database
        );
        let (client, connection) = self
            .params
            .to_config()
            .connect(NoTls)
            .await
            .map_err(PostgresSourceError::Connection)?;

        // Spawn the connection task
        let connection_task = tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!("PostgreSQL connection error: {}", e);
            }
        });

        // Test connection
        if let Err(e) = client.simple_query("SELECT 1").await {
            connection_task.abort();
            return Err(PostgresSourceError::Connection(e));
        }

        info!(
            "Connected to PostgreSQL database '{}' on {}",
            self.params.database, self.params.host
        );
        self.client = Some(client);
        self.connection_task = Some(connection_task);
        Ok(())
    }

    /// Execute `SELECT * FROM <table>` and return every row in result order.
    ///
    /// The table name is validated and quoted first; an invalid name fails
    /// without touching the database.
    pub async fn fetch_all(&self, table: &str) -> Result<Vec<SourceRow>, PostgresSourceError> {
        let table = TableName::parse(table)?;
        let client = self
            .client
            .as_ref()
            .ok_or(PostgresSourceError::NotConnected)?;

        let query = format!("SELECT * FROM {}", table.quoted());
        info!("Full sync querying table {table} with: {query}");
        let rows = client.query(query.as_str(), &[]).await?;
        info!("Full sync found {} rows in table {}", rows.len(), table);

        rows.iter().map(convert_row).collect()
    }

    /// Release the connection if one is open. Safe to call repeatedly or before `connect`.
    pub fn close(&mut self) {
        if self.client.take().is_some() {
            debug!("Closing PostgreSQL connection");
        }
        if let Some(task) = self.connection_task.take() {
            task.abort();
        }
    }
}

impl Drop for PostgresSource {
    fn drop(&mut self) {
        self.close();
    }
}

#[async_trait]
impl RowSource for PostgresSource {
    type Error = PostgresSourceError;

    async fn fetch_all(&self, table: &str) -> Result<Vec<SourceRow>, Self::Error> {
        PostgresSource::fetch_all(self, table).await
    }
}
