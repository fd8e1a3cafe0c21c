//! Columnar JSON encoding of a table, and row reconstruction from it
//!
//! On disk a table is `{"columns": [{"name": ..., "values": [...]}, ...]}`.
//! Artifacts written by this crate always have equal-length columns, but
//! older artifacts omit trailing values per column, so the reader never
//! assumes alignment.

use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One named column of values, aligned by row index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(default)]
    pub values: Vec<Value>,
}

/// A table stored column by column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnarArtifact {
    pub columns: Vec<Column>,
}

impl ColumnarArtifact {
    /// Transpose records into columns. Each column gets exactly one value per
    /// record, with `null` where the record lacks the column.
    pub fn from_records(column_names: &[String], records: &[Map<String, Value>]) -> Self {
        let columns = column_names
            .iter()
            .map(|name| Column {
                name: name.clone(),
                values: records
                    .iter()
                    .map(|record| record.get(name).cloned().unwrap_or(Value::Null))
                    .collect(),
            })
            .collect();

        Self { columns }
    }

    /// Row count implied by the longest column.
    pub fn num_rows(&self) -> usize {
        self.columns
            .iter()
            .map(|column| column.values.len())
            .max()
            .unwrap_or(0)
    }

    /// True when columns disagree on length.
    pub fn is_ragged(&self) -> bool {
        let num_rows = self.num_rows();
        self.columns.iter().any(|column| column.values.len() != num_rows)
    }

    pub fn into_rows(self) -> Vec<Map<String, Value>> {
        reconstruct_rows(&self.columns)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// Rebuild row-oriented records from columns.
///
/// The row count is the length of the longest column so no value is ever
/// truncated; a shorter column reads as `null` past its end.
pub fn reconstruct_rows(columns: &[Column]) -> Vec<Map<String, Value>> {
    let num_rows = columns
        .iter()
        .map(|column| column.values.len())
        .max()
        .unwrap_or(0);

    (0..num_rows)
        .map(|i| {
            columns
                .iter()
                .map(|column| {
                    let value = column.values.get(i).cloned().unwrap_or(Value::Null);
                    (column.name.clone(), value)
                })
                .collect()
        })
        .collect()
}

/// What an artifact blob decodes to.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// A columnar table, reconstructed into rows
    Rows(Vec<Map<String, Value>>),
    /// A document without `columns`, served as-is
    Passthrough(Value),
}

/// Decode artifact bytes into rows, or pass through documents that are not
/// columnar tables.
pub fn decode_payload(bytes: &[u8]) -> Result<Payload> {
    let document: Value = serde_json::from_slice(bytes)?;

    let is_columnar = document
        .as_object()
        .is_some_and(|object| object.contains_key("columns"));
    if !is_columnar {
        return Ok(Payload::Passthrough(document));
    }

    let artifact: ColumnarArtifact = serde_json::from_value(document)?;
    Ok(Payload::Rows(artifact.into_rows()))
}
