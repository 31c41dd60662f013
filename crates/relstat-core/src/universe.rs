//! Node universe loading.
//!
//! A node dump is a JSON document carrying one record per node. Two top-level
//! shapes are accepted: a direct array of records, or an object exposing the
//! array under `result`. Each record may carry a `uuid` field; records
//! without a usable identifier are skipped — they carry no degree information
//! and cannot be joined against the relation table.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::error::FormatError;

/// The set of unique identifiers belonging to one node type in one snapshot.
///
/// Deduplicated, never contains empty strings, immutable after construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeUniverse {
    ids: HashSet<String>,
}

/// Accepted top-level shapes of a node dump.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NodeDump {
    Wrapped { result: Vec<Value> },
    Records(Vec<Value>),
}

/// One node record, reduced to the only field this crate reads.
#[derive(Debug, Deserialize)]
struct NodeRecord {
    #[serde(default)]
    uuid: Option<Value>,
}

impl NodeUniverse {
    /// Parse a node dump document into a universe.
    ///
    /// `path` is used for error messages only; the content is `raw`.
    ///
    /// # Errors
    ///
    /// [`FormatError::Json`] if `raw` is not JSON at all;
    /// [`FormatError::UnrecognizedNodeDump`] if the top-level shape is
    /// neither a record array nor a `result`-wrapped record array.
    pub fn parse(path: &Path, raw: &str) -> Result<Self, FormatError> {
        let doc: Value = serde_json::from_str(raw).map_err(|source| FormatError::Json {
            path: path.to_path_buf(),
            source,
        })?;

        let records = match serde_json::from_value::<NodeDump>(doc) {
            Ok(NodeDump::Wrapped { result } | NodeDump::Records(result)) => result,
            Err(_) => {
                return Err(FormatError::UnrecognizedNodeDump {
                    path: path.to_path_buf(),
                });
            }
        };

        let mut ids = HashSet::new();
        for record in records {
            // Non-object records carry no uuid field and are skipped like
            // any other record without an identifier.
            let Ok(record) = serde_json::from_value::<NodeRecord>(record) else {
                continue;
            };
            if let Some(id) = record.uuid.as_ref().and_then(scalar_string) {
                ids.insert(id);
            }
        }

        tracing::debug!(path = %path.display(), nodes = ids.len(), "loaded node universe");
        Ok(Self { ids })
    }

    /// Whether `id` belongs to this universe.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Number of unique identifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Build a universe from identifiers directly (tests and callers that
    /// already hold a set).
    #[must_use]
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }
}

/// Convert a scalar JSON value to its identifier string.
///
/// Strings pass through untrimmed; numbers and booleans stringify. Null,
/// arrays, objects, and empty strings yield `None`.
fn scalar_string(value: &Value) -> Option<String> {
    let s = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };
    if s.is_empty() { None } else { Some(s) }
}
