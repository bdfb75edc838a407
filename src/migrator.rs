//! Full-table migration from a [`RowSource`] into a [`DocumentSink`].
//!
//! A pass is strictly linear: fetch every row, then transform and write in
//! fetch order, then done or failed. There is no rollback; when a write
//! fails, documents written before it stay in the target.

use crate::config::{MigrateOpts, WriteMode};
use crate::error::{MigrationError, StoreError};
use std::time::{Duration, Instant};
use sync_core::{
    transform_row, DocumentSink, RowSource, SourceRow, SubscriberDocument, TransformError,
};
use tracing::{debug, info};

/// Metrics from a migration pass.
#[derive(Debug, Clone, Default)]
pub struct MigrationReport {
    /// Rows returned by the source.
    pub rows_read: u64,
    /// Documents persisted in the target.
    pub documents_written: u64,
    /// Write round trips issued (one per document for single inserts and upserts).
    pub writes: u64,
    /// Whether writes were skipped.
    pub dry_run: bool,
    /// Time spent fetching rows.
    pub fetch_duration: Duration,
    /// Time spent writing documents.
    pub write_duration: Duration,
    /// Total time taken.
    pub total_duration: Duration,
}

impl MigrationReport {
    /// Calculate documents written per second.
    pub fn documents_per_second(&self) -> f64 {
        if self.total_duration.as_secs_f64() > 0.0 {
            self.documents_written as f64 / self.total_duration.as_secs_f64()
        } else {
            0.0
        }
    }
}

/// Copies one source table into one target collection.
pub struct Migrator<'a, S, T> {
    source: &'a S,
    target: &'a T,
    opts: MigrateOpts,
}

impl<'a, S: RowSource, T: DocumentSink> Migrator<'a, S, T> {
    /// Create a migrator with default options: one insert per row, short ids.
    pub fn new(source: &'a S, target: &'a T) -> Self {
        Self {
            source,
            target,
            opts: MigrateOpts::default(),
        }
    }

    /// Set the migration options.
    pub fn with_opts(mut self, opts: MigrateOpts) -> Self {
        self.opts = opts;
        self
    }

    /// Get the migration options.
    pub fn opts(&self) -> &MigrateOpts {
        &self.opts
    }

    /// Map one row into a document, generating its id.
    pub fn transform(&self, row: &SourceRow) -> Result<SubscriberDocument, TransformError> {
        transform_row(row, self.opts.id_strategy)
    }

    fn batch_size(&self) -> usize {
        usize::try_from(self.opts.batch_size)
            .unwrap_or(usize::MAX)
            .max(1)
    }

    /// Run one migration pass.
    ///
    /// Fails with [`MigrationError::Fetch`] before any write if the source
    /// cannot be read, and stops at the first transform or write failure.
    /// Documents buffered ahead of a row that fails to transform are written
    /// before the error is returned.
    pub async fn migrate(
        &self,
        source_table: &str,
        target_collection: &str,
    ) -> Result<MigrationReport, MigrationError> {
        let start_time = Instant::now();
        info!(
            "Migrating table '{}' into collection '{}' (batch size: {}, id strategy: {}, write mode: {:?})",
            source_table,
            target_collection,
            self.opts.batch_size,
            self.opts.id_strategy,
            self.opts.write_mode
        );

        let rows = self
            .source
            .fetch_all(source_table)
            .await
            .map_err(|e| MigrationError::Fetch {
                table: source_table.to_string(),
                source: Box::new(e),
            })?;

        let mut report = MigrationReport {
            rows_read: rows.len() as u64,
            dry_run: self.opts.dry_run,
            fetch_duration: start_time.elapsed(),
            ..Default::default()
        };

        if rows.is_empty() {
            info!("Table {source_table} is empty, nothing to migrate");
            report.total_duration = start_time.elapsed();
            return Ok(report);
        }

        let batch_size = self.batch_size();
        let mut batch = Vec::with_capacity(batch_size.min(rows.len()));

        for (index, row) in rows.iter().enumerate() {
            let document = match self.transform(row) {
                Ok(document) => document,
                Err(source) => {
                    // Rows before the bad one are written whatever the batch size
                    if !batch.is_empty() {
                        self.flush(target_collection, &mut batch, &mut report).await?;
                    }
                    return Err(MigrationError::Transform {
                        row: index + 1,
                        written: report.documents_written,
                        source,
                    });
                }
            };
            batch.push(document);

            if batch.len() >= batch_size {
                self.flush(target_collection, &mut batch, &mut report).await?;
            }
        }

        // Process remaining documents
        if !batch.is_empty() {
            self.flush(target_collection, &mut batch, &mut report).await?;
        }

        report.total_duration = start_time.elapsed();
        info!(
            "Migration complete: {} rows read, {} documents written in {:?} ({:.2} docs/sec)",
            report.rows_read,
            report.documents_written,
            report.total_duration,
            report.documents_per_second()
        );

        Ok(report)
    }

    async fn flush(
        &self,
        collection: &str,
        batch: &mut Vec<SubscriberDocument>,
        report: &mut MigrationReport,
    ) -> Result<(), MigrationError> {
        let write_start = Instant::now();

        if self.opts.dry_run {
            debug!(
                "Dry-run: Would write {} documents into {}",
                batch.len(),
                collection
            );
            batch.clear();
            return Ok(());
        }

        let result = self.write_batch(collection, batch, report).await;
        report.write_duration += write_start.elapsed();
        batch.clear();
        result
    }

    async fn write_batch(
        &self,
        collection: &str,
        batch: &[SubscriberDocument],
        report: &mut MigrationReport,
    ) -> Result<(), MigrationError> {
        let write_error = |written: u64, source: StoreError| MigrationError::Write {
            collection: collection.to_string(),
            written,
            source,
        };

        match self.opts.write_mode {
            WriteMode::Upsert => {
                for document in batch {
                    report.writes += 1;
                    self.target
                        .upsert_one(collection, document)
                        .await
                        .map_err(|e| write_error(report.documents_written, Box::new(e)))?;
                    report.documents_written += 1;
                }
            }
            WriteMode::Insert if self.batch_size() == 1 => {
                for document in batch {
                    report.writes += 1;
                    self.target
                        .insert_one(collection, document)
                        .await
                        .map_err(|e| write_error(report.documents_written, Box::new(e)))?;
                    report.documents_written += 1;
                }
            }
            WriteMode::Insert => {
                report.writes += 1;
                match self.target.insert_many(collection, batch).await {
                    Ok(inserted) => {
                        report.documents_written += inserted;
                        debug!(
                            "Batch {} complete: {} documents inserted into {}",
                            report.writes, inserted, collection
                        );
                    }
                    Err(e) => {
                        let persisted = T::persisted_before_failure(&e);
                        report.documents_written += persisted;
                        return Err(write_error(report.documents_written, Box::new(e)));
                    }
                }
            }
        }

        Ok(())
    }
}
