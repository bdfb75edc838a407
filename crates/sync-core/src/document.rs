//! Subscriber documents and the row-to-document transform.
//!
//! Rows are read positionally as `(msisdn, name, gender, address, age)`.
//! Values are carried into the document unchanged; only `id` is new.

use crate::values::{SourceRow, SourceValue};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Number of leading row values the transform reads.
pub const SUBSCRIBER_COLUMNS: usize = 5;

/// Namespace for ids derived from the source key.
///
/// Changing this value changes every `source-key` id, so reruns would no
/// longer match documents written by earlier runs.
pub const SOURCE_KEY_NAMESPACE: Uuid = Uuid::from_u128(0x6d2c_41a8_9f0e_4b7a_b3c1_52e8_d07f_a914);

/// Errors produced while turning a row into a document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    /// The row is shorter than the positional contract.
    #[error("Row has {found} columns, expected at least {expected}")]
    TooFewColumns { expected: usize, found: usize },

    /// A deterministic id was requested but the key column cannot identify the row.
    #[error("Column 'msisdn' cannot be used as a source key: {0}")]
    InvalidSourceKey(String),
}

/// How the `id` field of each document is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdStrategy {
    /// First 8 hex characters of a random UUID. Not collision free at scale.
    #[default]
    Short,
    /// Full hyphenated random UUID.
    Uuid,
    /// UUID v5 of the row's msisdn; the same row always gets the same id.
    SourceKey,
}

impl IdStrategy {
    /// Convert to string representation used on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            IdStrategy::Short => "short",
            IdStrategy::Uuid => "uuid",
            IdStrategy::SourceKey => "source-key",
        }
    }

    /// Whether repeated transforms of an equal row give an equal id.
    pub fn is_deterministic(&self) -> bool {
        matches!(self, IdStrategy::SourceKey)
    }

    /// Produce an id for a row whose key column holds `msisdn`.
    pub fn generate(&self, msisdn: &SourceValue) -> Result<String, TransformError> {
        match self {
            IdStrategy::Short => Ok(format!("{:08x}", Uuid::new_v4().as_fields().0)),
            IdStrategy::Uuid => Ok(Uuid::new_v4().hyphenated().to_string()),
            IdStrategy::SourceKey => {
                let key = msisdn.key_text().ok_or_else(|| {
                    TransformError::InvalidSourceKey(format!("unsupported value {msisdn:?}"))
                })?;
                if key.is_empty() {
                    return Err(TransformError::InvalidSourceKey(
                        "empty value".to_string(),
                    ));
                }
                Ok(Uuid::new_v5(&SOURCE_KEY_NAMESPACE, key.as_bytes())
                    .hyphenated()
                    .to_string())
            }
        }
    }
}

impl FromStr for IdStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "short" => Ok(IdStrategy::Short),
            "uuid" => Ok(IdStrategy::Uuid),
            "source-key" => Ok(IdStrategy::SourceKey),
            other => Err(format!(
                "Unknown id strategy '{other}' (expected short, uuid or source-key)"
            )),
        }
    }
}

impl fmt::Display for IdStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Document written to the target collection for one source row.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriberDocument {
    pub id: String,
    pub msisdn: SourceValue,
    pub name: SourceValue,
    pub gender: SourceValue,
    pub address: SourceValue,
    pub age: SourceValue,
}

impl SubscriberDocument {
    /// Named fields other than `id`, in document order.
    pub fn fields(&self) -> [(&'static str, &SourceValue); SUBSCRIBER_COLUMNS] {
        [
            ("msisdn", &self.msisdn),
            ("name", &self.name),
            ("gender", &self.gender),
            ("address", &self.address),
            ("age", &self.age),
        ]
    }
}

/// Map a positional row into a [`SubscriberDocument`].
///
/// Rows shorter than [`SUBSCRIBER_COLUMNS`] fail; extra values are dropped.
pub fn transform_row(
    row: &SourceRow,
    id_strategy: IdStrategy,
) -> Result<SubscriberDocument, TransformError> {
    if row.len() < SUBSCRIBER_COLUMNS {
        return Err(TransformError::TooFewColumns {
            expected: SUBSCRIBER_COLUMNS,
            found: row.len(),
        });
    }

    let mut values = row.iter().take(SUBSCRIBER_COLUMNS).cloned();
    // Length checked above.
    let mut next = || values.next().unwrap_or(SourceValue::Null);
    let msisdn = next();
    let name = next();
    let gender = next();
    let address = next();
    let age = next();

    let id = id_strategy.generate(&msisdn)?;

    Ok(SubscriberDocument {
        id,
        msisdn,
        name,
        gender,
        address,
        age,
    })
}
