//! Migration pass behavior against in-memory stores.

use pg_mongo_sync::testing::{
    init_logging, subscriber_row, subscriber_rows, MemorySink, MemorySource, SinkCall,
};
use pg_mongo_sync::{MigrateOpts, MigrationError, Migrator, WriteMode};
use sync_core::{IdStrategy, SourceRow, SourceValue, TransformError};

const TABLE: &str = "subscribers";
const COLLECTION: &str = "subscribers";

fn opts(batch_size: u64, id_strategy: IdStrategy, write_mode: WriteMode) -> MigrateOpts {
    MigrateOpts {
        batch_size,
        id_strategy,
        write_mode,
        dry_run: false,
    }
}

#[tokio::test]
async fn test_one_insert_per_row_in_fetch_order() {
    init_logging();
    let rows = subscriber_rows(5);
    let source = MemorySource::new().with_table(TABLE, rows.clone());
    let sink = MemorySink::new();

    let report = Migrator::new(&source, &sink)
        .migrate(TABLE, COLLECTION)
        .await
        .unwrap();

    assert_eq!(report.rows_read, 5);
    assert_eq!(report.documents_written, 5);
    assert_eq!(report.writes, 5);
    assert_eq!(source.fetches(), vec![TABLE.to_string()]);

    let calls = sink.calls();
    assert_eq!(calls.len(), 5);
    assert!(calls
        .iter()
        .all(|call| matches!(call, SinkCall::InsertOne { collection, .. } if collection == COLLECTION)));

    let documents = sink.documents(COLLECTION);
    let msisdns: Vec<&SourceValue> = documents.iter().map(|doc| &doc.msisdn).collect();
    let expected: Vec<&SourceValue> = rows.iter().map(|row| row.get(0).unwrap()).collect();
    assert_eq!(msisdns, expected);

    // Insert calls carry the documents in the same order
    let call_ids: Vec<String> = calls
        .into_iter()
        .filter_map(|call| match call {
            SinkCall::InsertOne { id, .. } => Some(id),
            _ => None,
        })
        .collect();
    let doc_ids: Vec<String> = documents.into_iter().map(|doc| doc.id).collect();
    assert_eq!(call_ids, doc_ids);
}

#[tokio::test]
async fn test_jane_doe_document() {
    let source = MemorySource::new().with_table(
        TABLE,
        vec![subscriber_row("15551234567", "Jane Doe", "F", "123 Main St", 29)],
    );
    let sink = MemorySink::new();

    Migrator::new(&source, &sink)
        .migrate(TABLE, COLLECTION)
        .await
        .unwrap();

    let documents = sink.documents(COLLECTION);
    assert_eq!(documents.len(), 1);
    let doc = &documents[0];
    assert_eq!(doc.id.len(), 8);
    assert!(doc.id.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(doc.msisdn, SourceValue::from("15551234567"));
    assert_eq!(doc.name, SourceValue::from("Jane Doe"));
    assert_eq!(doc.gender, SourceValue::from("F"));
    assert_eq!(doc.address, SourceValue::from("123 Main St"));
    assert_eq!(doc.age, SourceValue::Int32(29));
}

#[tokio::test]
async fn test_empty_table_writes_nothing() {
    let source = MemorySource::new().with_table(TABLE, Vec::new());
    let sink = MemorySink::new();

    let report =
        tokio_test::assert_ok!(Migrator::new(&source, &sink).migrate(TABLE, COLLECTION).await);

    assert_eq!(report.rows_read, 0);
    assert_eq!(report.documents_written, 0);
    assert!(sink.calls().is_empty());
}

#[tokio::test]
async fn test_fetch_failure_writes_nothing() {
    let source = MemorySource::new()
        .with_table(TABLE, subscriber_rows(3))
        .failing("connection reset by peer");
    let sink = MemorySink::new();

    let err = Migrator::new(&source, &sink)
        .migrate(TABLE, COLLECTION)
        .await
        .unwrap_err();

    assert!(matches!(err, MigrationError::Fetch { ref table, .. } if table == TABLE));
    assert!(err.to_string().contains("connection reset by peer"));
    assert_eq!(err.documents_written(), 0);
    assert!(!err.is_partial());
    assert!(sink.calls().is_empty());
}

#[tokio::test]
async fn test_missing_table_is_a_fetch_error() {
    let source = MemorySource::new();
    let sink = MemorySink::new();

    let err = Migrator::new(&source, &sink)
        .migrate("missing", COLLECTION)
        .await
        .unwrap_err();

    assert!(matches!(err, MigrationError::Fetch { .. }));
    assert_eq!(sink.count(COLLECTION), 0);
}

#[tokio::test]
async fn test_kth_insert_failure_keeps_earlier_documents() {
    let k = 4;
    let source = MemorySource::new().with_table(TABLE, subscriber_rows(6));
    let sink = MemorySink::new().failing_at(k);

    let err = Migrator::new(&source, &sink)
        .migrate(TABLE, COLLECTION)
        .await
        .unwrap_err();

    assert!(matches!(err, MigrationError::Write { written: 3, .. }));
    assert!(err.is_partial());

    // k inserts were attempted, none after the failure
    assert_eq!(sink.calls().len() as u64, k);
    // The first k-1 documents stay in the target
    assert_eq!(sink.count(COLLECTION) as u64, k - 1);
    let msisdns: Vec<SourceValue> = sink
        .documents(COLLECTION)
        .into_iter()
        .map(|doc| doc.msisdn)
        .collect();
    assert_eq!(
        msisdns,
        vec![
            SourceValue::from("15550000000"),
            SourceValue::from("15550000001"),
            SourceValue::from("15550000002"),
        ]
    );
}

#[tokio::test]
async fn test_first_insert_failure() {
    let source = MemorySource::new().with_table(TABLE, subscriber_rows(2));
    let sink = MemorySink::new().failing_at(1);

    let err = Migrator::new(&source, &sink)
        .migrate(TABLE, COLLECTION)
        .await
        .unwrap_err();

    assert_eq!(err.documents_written(), 0);
    assert_eq!(sink.count(COLLECTION), 0);
}

#[tokio::test]
async fn test_short_row_fails_clearly() {
    let rows = vec![
        subscriber_row("15551234567", "Jane Doe", "F", "123 Main St", 29),
        SourceRow::new(vec!["15550000000".into(), "No Address".into()]),
        subscriber_row("15557654321", "John Roe", "M", "9 Elm St", 41),
    ];
    let source = MemorySource::new().with_table(TABLE, rows);
    let sink = MemorySink::new();

    let err = Migrator::new(&source, &sink)
        .migrate(TABLE, COLLECTION)
        .await
        .unwrap_err();

    match err {
        MigrationError::Transform {
            row,
            written,
            source,
        } => {
            assert_eq!(row, 2);
            assert_eq!(written, 1);
            assert_eq!(
                source,
                TransformError::TooFewColumns {
                    expected: 5,
                    found: 2
                }
            );
        }
        other => panic!("expected transform error, got {other:?}"),
    }
    assert_eq!(sink.count(COLLECTION), 1);
}

#[tokio::test]
async fn test_short_row_flushes_pending_batch() {
    let rows = vec![
        subscriber_row("15551234567", "Jane Doe", "F", "123 Main St", 29),
        subscriber_row("15557654321", "John Roe", "M", "9 Elm St", 41),
        SourceRow::new(vec!["15550000000".into()]),
    ];
    let source = MemorySource::new().with_table(TABLE, rows);
    let sink = MemorySink::new();

    let err = Migrator::new(&source, &sink)
        .with_opts(opts(3, IdStrategy::Short, WriteMode::Insert))
        .migrate(TABLE, COLLECTION)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        MigrationError::Transform {
            row: 3,
            written: 2,
            ..
        }
    ));
    assert_eq!(sink.count(COLLECTION), 2);
    assert_eq!(
        sink.calls(),
        vec![SinkCall::InsertMany {
            collection: COLLECTION.to_string(),
            count: 2
        }]
    );
}

#[tokio::test]
async fn test_short_row_after_failed_flush_reports_write_error() {
    let rows = vec![
        subscriber_row("15551234567", "Jane Doe", "F", "123 Main St", 29),
        subscriber_row("15557654321", "John Roe", "M", "9 Elm St", 41),
        SourceRow::new(vec!["15550000000".into()]),
    ];
    let source = MemorySource::new().with_table(TABLE, rows);
    let sink = MemorySink::new().failing_at(2);

    let err = Migrator::new(&source, &sink)
        .with_opts(opts(3, IdStrategy::Short, WriteMode::Insert))
        .migrate(TABLE, COLLECTION)
        .await
        .unwrap_err();

    assert!(matches!(err, MigrationError::Write { written: 1, .. }));
    assert_eq!(sink.count(COLLECTION), 1);
}

#[tokio::test]
async fn test_batched_inserts() {
    let source = MemorySource::new().with_table(TABLE, subscriber_rows(7));
    let sink = MemorySink::new();

    let report = Migrator::new(&source, &sink)
        .with_opts(opts(3, IdStrategy::Short, WriteMode::Insert))
        .migrate(TABLE, COLLECTION)
        .await
        .unwrap();

    assert_eq!(report.documents_written, 7);
    assert_eq!(report.writes, 3);
    let counts: Vec<usize> = sink
        .calls()
        .into_iter()
        .map(|call| match call {
            SinkCall::InsertMany { count, .. } => count,
            other => panic!("expected bulk insert, got {other:?}"),
        })
        .collect();
    assert_eq!(counts, vec![3, 3, 1]);
    assert_eq!(sink.count(COLLECTION), 7);
}

#[tokio::test]
async fn test_batch_failure_reports_partial_batch() {
    let source = MemorySource::new().with_table(TABLE, subscriber_rows(10));
    let sink = MemorySink::new().failing_at(6);

    let err = Migrator::new(&source, &sink)
        .with_opts(opts(4, IdStrategy::Short, WriteMode::Insert))
        .migrate(TABLE, COLLECTION)
        .await
        .unwrap_err();

    // First batch of 4 succeeded, second batch stopped after one document
    assert!(matches!(err, MigrationError::Write { written: 5, .. }));
    assert_eq!(sink.count(COLLECTION), 5);
    assert_eq!(sink.calls().len(), 2);
}

#[tokio::test]
async fn test_reruns_duplicate_with_random_ids() {
    let source = MemorySource::new().with_table(TABLE, subscriber_rows(3));
    let sink = MemorySink::new();
    let migrator = Migrator::new(&source, &sink);

    migrator.migrate(TABLE, COLLECTION).await.unwrap();
    migrator.migrate(TABLE, COLLECTION).await.unwrap();

    let documents = sink.documents(COLLECTION);
    assert_eq!(documents.len(), 6);
    let mut ids: Vec<&str> = documents.iter().map(|doc| doc.id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 6);
}

#[tokio::test]
async fn test_source_key_upsert_rerun_is_idempotent() {
    let source = MemorySource::new().with_table(TABLE, subscriber_rows(4));
    let sink = MemorySink::new();
    let migrator = Migrator::new(&source, &sink)
        .with_opts(opts(2, IdStrategy::SourceKey, WriteMode::Upsert));

    let first = migrator.migrate(TABLE, COLLECTION).await.unwrap();
    let ids_after_first: Vec<String> = sink
        .documents(COLLECTION)
        .into_iter()
        .map(|doc| doc.id)
        .collect();
    let second = migrator.migrate(TABLE, COLLECTION).await.unwrap();

    assert_eq!(first.documents_written, 4);
    assert_eq!(second.documents_written, 4);
    // Upserts are one round trip per document regardless of batch size
    assert_eq!(second.writes, 4);
    assert_eq!(sink.count(COLLECTION), 4);
    let ids_after_second: Vec<String> = sink
        .documents(COLLECTION)
        .into_iter()
        .map(|doc| doc.id)
        .collect();
    assert_eq!(ids_after_first, ids_after_second);
    assert!(sink
        .calls()
        .iter()
        .all(|call| matches!(call, SinkCall::UpsertOne { .. })));
}

#[tokio::test]
async fn test_dry_run_writes_nothing() {
    let source = MemorySource::new().with_table(TABLE, subscriber_rows(3));
    let sink = MemorySink::new();

    let report = Migrator::new(&source, &sink)
        .with_opts(MigrateOpts {
            dry_run: true,
            ..MigrateOpts::default()
        })
        .migrate(TABLE, COLLECTION)
        .await
        .unwrap();

    assert!(report.dry_run);
    assert_eq!(report.rows_read, 3);
    assert_eq!(report.documents_written, 0);
    assert!(sink.calls().is_empty());
}

#[test]
fn test_transform_generates_fresh_ids() {
    let source = MemorySource::new();
    let sink = MemorySink::new();
    let migrator = Migrator::new(&source, &sink);
    let row = subscriber_row("15551234567", "Jane Doe", "F", "123 Main St", 29);

    let first = migrator.transform(&row).unwrap();
    let second = migrator.transform(&row).unwrap();

    assert!(!first.id.is_empty());
    assert_ne!(first.id, second.id);
    assert_eq!(first.fields(), second.fields());
}
