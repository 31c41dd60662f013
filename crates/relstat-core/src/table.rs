//! Relation TABLE dump parsing.
//!
//! A relation dump is a JSON object with `"type": "TABLE"` and a `result`
//! holding `headers` (positional column descriptors) and `rows` (each with
//! positional `values`). The first two columns carry the edge endpoints;
//! anything beyond that only matters to the CSV converter.
//!
//! Row order is preserved exactly: the extracted edge list is the canonical
//! ordering for the rest of the pipeline and is never reordered.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use crate::error::FormatError;

/// An identifier pair exactly as it appears in the dump, with no commitment
/// as to which element is the source and which the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEdge {
    pub left: String,
    pub right: String,
}

impl RawEdge {
    #[must_use]
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
        }
    }
}

/// A parsed relation TABLE: header cells and row values, shape-checked but
/// otherwise uninterpreted.
#[derive(Debug, Clone)]
pub struct RelationTable {
    path: PathBuf,
    headers: Vec<Value>,
    rows: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct RelationDump {
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    result: Option<TableResult>,
}

#[derive(Debug, Default, Deserialize)]
struct TableResult {
    #[serde(default)]
    headers: Vec<Value>,
    #[serde(default)]
    rows: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct TableRow {
    #[serde(default)]
    values: Vec<Value>,
}

impl RelationTable {
    /// Parse a relation dump document.
    ///
    /// Failures are checked in order: JSON syntax, then the `TABLE` type
    /// marker, then the two-column minimum. Defective rows are not errors —
    /// they are retained here and skipped at extraction time.
    ///
    /// # Errors
    ///
    /// [`FormatError::Json`], [`FormatError::NotATable`], or
    /// [`FormatError::TooFewColumns`].
    pub fn parse(path: &Path, raw: &str) -> Result<Self, FormatError> {
        let doc: Value = serde_json::from_str(raw).map_err(|source| FormatError::Json {
            path: path.to_path_buf(),
            source,
        })?;

        let dump = serde_json::from_value::<RelationDump>(doc).map_err(|_| {
            FormatError::NotATable {
                path: path.to_path_buf(),
            }
        })?;

        if dump.kind.as_deref() != Some("TABLE") {
            return Err(FormatError::NotATable {
                path: path.to_path_buf(),
            });
        }

        let result = dump.result.unwrap_or_default();
        if result.headers.len() < 2 {
            return Err(FormatError::TooFewColumns {
                path: path.to_path_buf(),
                found: result.headers.len(),
            });
        }

        let rows = result
            .rows
            .into_iter()
            .filter_map(|row| serde_json::from_value::<TableRow>(row).ok())
            .map(|row| row.values)
            .collect();

        Ok(Self {
            path: path.to_path_buf(),
            headers: result.headers,
            rows,
        })
    }

    /// Number of columns declared by the header list.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Number of rows, including rows the edge extractor will skip.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Extract the ordered raw edge list from the first two columns.
    ///
    /// A row is skipped when either of its first two values is missing,
    /// null, non-scalar, or empty after trimming. Surviving rows become
    /// edges in row order.
    #[must_use]
    pub fn raw_edges(&self) -> Vec<RawEdge> {
        let mut edges = Vec::new();
        for values in &self.rows {
            let Some(left) = values.first().and_then(trimmed_scalar) else {
                continue;
            };
            let Some(right) = values.get(1).and_then(trimmed_scalar) else {
                continue;
            };
            edges.push(RawEdge { left, right });
        }
        edges
    }

    /// Column names from `headers[i].name`, for CSV conversion.
    ///
    /// Unlike edge extraction this is strict: a header cell that is not an
    /// object with a scalar-convertible `name` is a format defect.
    ///
    /// # Errors
    ///
    /// [`FormatError::HeaderName`] naming the offending column.
    pub fn header_names(&self) -> Result<Vec<String>, FormatError> {
        self.headers
            .iter()
            .enumerate()
            .map(|(column, header)| {
                header
                    .get("name")
                    .and_then(scalar_text)
                    .ok_or(FormatError::HeaderName {
                        path: self.path.clone(),
                        column,
                    })
            })
            .collect()
    }

    /// All rows stringified for CSV output: missing and null cells become
    /// empty strings, scalars their plain text, compound values compact JSON.
    #[must_use]
    pub fn stringified_rows(&self) -> Vec<Vec<String>> {
        let width = self.headers.len();
        self.rows
            .iter()
            .map(|values| {
                (0..width.max(values.len()))
                    .map(|i| values.get(i).map_or_else(String::new, cell_text))
                    .collect()
            })
            .collect()
    }
}

/// Scalar value to trimmed identifier text; `None` for null/compound/empty.
fn trimmed_scalar(value: &Value) -> Option<String> {
    let s = scalar_text(value)?;
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Scalar value to text, untrimmed; `None` for null, arrays, and objects.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Cell text for CSV output.
fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        // Compound cells should not occur in TABLE dumps; keep them
        // inspectable rather than dropping them.
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}
