//! Validated table identifiers.
//!
//! Table names reach the SQL text only through [`TableName::quoted`], so a
//! name that is not a plain identifier never becomes part of a query.

use crate::error::PostgresSourceError;
use std::fmt;

/// PostgreSQL truncates identifiers longer than this (NAMEDATALEN - 1).
pub const MAX_IDENTIFIER_LEN: usize = 63;

/// A table name of the form `table` or `schema.table`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableName {
    schema: Option<String>,
    table: String,
}

impl TableName {
    /// Parse and validate a table name.
    ///
    /// Each part must start with an ASCII letter or underscore and contain
    /// only ASCII letters, digits, underscores and `$`. Parts are folded to
    /// lower case, as PostgreSQL does for unquoted names.
    pub fn parse(name: &str) -> Result<Self, PostgresSourceError> {
        let invalid = |reason| PostgresSourceError::InvalidTableName {
            name: name.to_string(),
            reason,
        };

        let mut parts = name.split('.');
        let first = parts.next().unwrap_or_default();
        let second = parts.next();
        if parts.next().is_some() {
            return Err(invalid("expected 'table' or 'schema.table'"));
        }

        let (schema, table) = match second {
            Some(table) => (Some(first), table),
            None => (None, first),
        };

        if let Some(schema) = schema {
            validate_identifier(schema).map_err(invalid)?;
        }
        validate_identifier(table).map_err(invalid)?;

        Ok(Self {
            schema: schema.map(str::to_ascii_lowercase),
            table: table.to_ascii_lowercase(),
        })
    }

    /// Schema part, if the name was qualified.
    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// Unqualified table part.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Render as a double-quoted identifier for use in SQL text.
    pub fn quoted(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", quote_identifier(schema), quote_identifier(&self.table)),
            None => quote_identifier(&self.table),
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{schema}.{}", self.table),
            None => f.write_str(&self.table),
        }
    }
}

fn validate_identifier(part: &str) -> Result<(), &'static str> {
    let mut chars = part.chars();
    match chars.next() {
        None => return Err("identifier is empty"),
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        Some(_) => return Err("identifier must start with a letter or underscore"),
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$') {
        return Err("identifier may only contain letters, digits, '_' and '$'");
    }
    if part.len() > MAX_IDENTIFIER_LEN {
        return Err("identifier is longer than 63 bytes");
    }
    Ok(())
}

/// Double-quote an identifier, doubling any embedded quotes.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
