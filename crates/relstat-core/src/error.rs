//! Error taxonomy for dump loading and analysis.
//!
//! Two families, both raised eagerly before any partial computation:
//!
//! - [`FormatError`] — an input document exists but does not match the
//!   expected shape.
//! - [`DumpError`] — a required input cannot be located or read, or carries
//!   a format defect.
//!
//! Row-level defects (missing or empty values in a single row) are never
//! errors; they are skipped at the parse site. Ambiguous edge orientation is
//! data, not an error — see [`crate::orient`].

use std::io;
use std::path::PathBuf;

/// An input document does not match the expected shape.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// The document is not valid JSON at all.
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A node dump is neither an array of records nor an object with a
    /// `result` array.
    #[error("unrecognized node dump format in {path}")]
    UnrecognizedNodeDump { path: PathBuf },

    /// A relation dump whose `type` field is not `"TABLE"`.
    #[error("{path} is not a TABLE relation dump")]
    NotATable { path: PathBuf },

    /// A relation TABLE with fewer than two columns.
    #[error("relation TABLE in {path} must have at least two columns, found {found}")]
    TooFewColumns { path: PathBuf, found: usize },

    /// A header cell without a usable `name` (CSV conversion only).
    #[error("header column {column} in {path} has no usable name")]
    HeaderName { path: PathBuf, column: usize },
}

/// A required input resource cannot be located, read, or parsed.
#[derive(Debug, thiserror::Error)]
pub enum DumpError {
    /// A required input file is absent. `what` names the role the file
    /// plays so the message locates the problem for the operator.
    #[error("{what} not found: {path}")]
    NotFound { what: &'static str, path: PathBuf },

    /// I/O failure while reading an input file.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file was read but its content is malformed.
    #[error(transparent)]
    Format(#[from] FormatError),
}

impl DumpError {
    /// Optional remediation hint surfaced by the CLI error renderer.
    #[must_use]
    pub const fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::NotFound { .. } => {
                Some("Check the data root (--root) and that the dump has been fetched.")
            }
            Self::Io { .. } | Self::Format(_) => None,
        }
    }

    /// Stable machine-readable code for JSON error output.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Io { .. } => "io",
            Self::Format(_) => "format",
        }
    }
}
