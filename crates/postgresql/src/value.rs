//! PostgreSQL column to [`SourceValue`] conversion.

use crate::error::PostgresSourceError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use sync_core::{SourceRow, SourceValue};
use tokio_postgres::types::{FromSql, Type};
use tokio_postgres::Row;
use tracing::warn;

/// Convert every column of a PostgreSQL row, keeping column order.
pub fn convert_row(row: &Row) -> Result<SourceRow, PostgresSourceError> {
    (0..row.columns().len())
        .map(|index| convert_postgres_value(row, index))
        .collect()
}

fn get<'a, T: FromSql<'a>>(row: &'a Row, index: usize) -> Result<Option<T>, PostgresSourceError> {
    row.try_get::<_, Option<T>>(index)
        .map_err(|source| PostgresSourceError::Column {
            column: row.columns()[index].name().to_string(),
            source,
        })
}

/// Convert a single PostgreSQL column value to a [`SourceValue`].
pub fn convert_postgres_value(row: &Row, index: usize) -> Result<SourceValue, PostgresSourceError> {
    let column = &row.columns()[index];
    let pg_type = column.type_();

    let value = match *pg_type {
        Type::BOOL => get::<bool>(row, index)?.map(SourceValue::Bool),
        Type::INT2 => get::<i16>(row, index)?.map(|i| SourceValue::Int32(i32::from(i))),
        Type::INT4 => get::<i32>(row, index)?.map(SourceValue::Int32),
        Type::INT8 => get::<i64>(row, index)?.map(SourceValue::Int64),
        Type::FLOAT4 => get::<f32>(row, index)?.map(|f| SourceValue::Float64(f64::from(f))),
        Type::FLOAT8 => get::<f64>(row, index)?.map(SourceValue::Float64),
        Type::NUMERIC => get::<Decimal>(row, index)?.map(|d| SourceValue::Decimal(d.to_string())),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => {
            get::<String>(row, index)?.map(SourceValue::Text)
        }
        Type::TIMESTAMP => get::<NaiveDateTime>(row, index)?
            .map(|ts| SourceValue::Timestamp(DateTime::<Utc>::from_naive_utc_and_offset(ts, Utc))),
        Type::TIMESTAMPTZ => get::<DateTime<Utc>>(row, index)?.map(SourceValue::Timestamp),
        Type::DATE => get::<NaiveDate>(row, index)?.map(SourceValue::Date),
        Type::TIME => get::<NaiveTime>(row, index)?.map(|t| SourceValue::Text(t.to_string())),
        Type::UUID => get::<uuid::Uuid>(row, index)?.map(SourceValue::Uuid),
        Type::JSON | Type::JSONB => get::<serde_json::Value>(row, index)?.map(SourceValue::Json),
        Type::BYTEA => get::<Vec<u8>>(row, index)?.map(SourceValue::Bytes),
        _ => match row.try_get::<_, Option<String>>(index) {
            Ok(value) => value.map(SourceValue::Text),
            Err(e) => {
                warn!(
                    "Column '{}' has unsupported type {} and is not readable as text: {}",
                    column.name(),
                    pg_type,
                    e
                );
                return Err(PostgresSourceError::UnsupportedType {
                    column: column.name().to_string(),
                    type_name: pg_type.name().to_string(),
                });
            }
        },
    };

    Ok(value.unwrap_or(SourceValue::Null))
}
