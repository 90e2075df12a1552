//! Column identity - Global, stable identity for every profiled column
//!
//! Format: `column:<id>:<dbName>:<path>:<sourceName>:<columnName>`
//!
//! Examples:
//! - `column:7:sales_db:/data/q1.csv:csv_source:region`
//! - `column:12:hr_db:/exports/staff.csv:csv_source:employee%3Aid`
//!
//! Field values are percent-escaped (`%` and `:` only) before joining, so the
//! local name is injective over the five-tuple and can be parsed back.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// IRI prefix shared by every column subject.
pub const IRI_PREFIX: &str = "column:";

/// Composite key identifying one physical column across all sources.
///
/// The derived local name serves as the statement subject for:
/// - Raw sample values
/// - Column metadata
/// - Computed profile statistics
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnId {
    /// Numeric source-assigned identifier
    pub id: i64,
    /// Database the column belongs to
    pub db_name: String,
    /// Path of the backing file or table
    pub path: String,
    /// Name of the source that produced the column
    pub source_name: String,
    /// Column name within the source
    pub column_name: String,
}

impl ColumnId {
    /// Create a new ColumnId
    pub fn new(
        id: i64,
        db_name: impl Into<String>,
        path: impl Into<String>,
        source_name: impl Into<String>,
        column_name: impl Into<String>,
    ) -> Self {
        Self {
            id,
            db_name: db_name.into(),
            path: path.into(),
            source_name: source_name.into(),
            column_name: column_name.into(),
        }
    }

    /// Colon-joined local name with escaped field values.
    ///
    /// Distinct tuples always produce distinct local names: `%` becomes
    /// `%25` and `:` becomes `%3A` inside each field before joining.
    pub fn local_name(&self) -> String {
        format!(
            "{}:{}:{}:{}:{}",
            self.id,
            escape(&self.db_name),
            escape(&self.path),
            escape(&self.source_name),
            escape(&self.column_name),
        )
    }

    /// Full subject IRI: the local name under the `column:` prefix.
    pub fn iri(&self) -> String {
        format!("{}{}", IRI_PREFIX, self.local_name())
    }

    /// Parse a subject IRI back into a ColumnId
    ///
    /// Expected format: `column:<id>:<dbName>:<path>:<sourceName>:<columnName>`
    pub fn parse(iri: &str) -> Result<Self> {
        let local = iri
            .strip_prefix(IRI_PREFIX)
            .ok_or_else(|| Error::InvalidIdentifier(format!("missing {IRI_PREFIX} prefix: {iri}")))?;

        let fields: Vec<&str> = local.split(':').collect();
        if fields.len() != 5 {
            return Err(Error::InvalidIdentifier(format!(
                "expected 5 fields, got {}: {local}",
                fields.len()
            )));
        }

        let id: i64 = fields[0]
            .parse()
            .map_err(|_| Error::InvalidIdentifier(format!("invalid numeric id: {}", fields[0])))?;

        Ok(Self {
            id,
            db_name: unescape(fields[1])?,
            path: unescape(fields[2])?,
            source_name: unescape(fields[3])?,
            column_name: unescape(fields[4])?,
        })
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.iri())
    }
}

impl FromStr for ColumnId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn escape(field: &str) -> String {
    // Escape `%` first so escaped separators stay unambiguous.
    field.replace('%', "%25").replace(':', "%3A")
}

fn unescape(field: &str) -> Result<String> {
    let mut out = String::with_capacity(field.len());
    let mut chars = field.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        let pair: String = chars.by_ref().take(2).collect();
        match pair.as_str() {
            "25" => out.push('%'),
            "3A" | "3a" => out.push(':'),
            _ => {
                return Err(Error::InvalidIdentifier(format!(
                    "invalid escape %{pair} in field: {field}"
                )));
            }
        }
    }
    Ok(out)
}
