//! On-disk layout of a relstat data root.
//!
//! All path conventions live here so the analyzer, converter, fetcher, and
//! indexer agree on where things are:
//!
//! ```text
//! <root>/
//!   raw/
//!     nodes/<TYPE>.json            node dumps
//!     relations/<RELATION>.json    relation TABLE dumps
//!   metadata/
//!     nodes/<type>.json            fetched full type documents
//!     relations/<type>.json
//!     node_index.json              compact fetch indexes
//!     relation_index.json
//!   stats/
//!     <snapshot>/relations/<RELATION>.json   analyzer reports
//!     index.json                             snapshot index
//!   csv/<RELATION>.csv             converter output
//! ```

use std::path::{Path, PathBuf};

use crate::error::DumpError;

/// Path conventions rooted at one data directory.
#[derive(Debug, Clone)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Node dump for one node type.
    #[must_use]
    pub fn node_dump(&self, node_type: &str) -> PathBuf {
        self.root
            .join("raw")
            .join("nodes")
            .join(format!("{node_type}.json"))
    }

    /// Relation TABLE dump.
    #[must_use]
    pub fn relation_dump(&self, relation: &str) -> PathBuf {
        self.root
            .join("raw")
            .join("relations")
            .join(format!("{relation}.json"))
    }

    /// Directory holding all relation dumps (scanned by `convert --all`).
    #[must_use]
    pub fn relation_dump_dir(&self) -> PathBuf {
        self.root.join("raw").join("relations")
    }

    /// Report output path for one (snapshot, relation) pair.
    #[must_use]
    pub fn stats_report(&self, snapshot: &str, relation: &str) -> PathBuf {
        self.stats_root()
            .join(snapshot)
            .join("relations")
            .join(format!("{relation}.json"))
    }

    /// Root of all snapshot statistics.
    #[must_use]
    pub fn stats_root(&self) -> PathBuf {
        self.root.join("stats")
    }

    /// The snapshot index document.
    #[must_use]
    pub fn stats_index(&self) -> PathBuf {
        self.stats_root().join("index.json")
    }

    /// Full fetched metadata document for one node or relation type.
    #[must_use]
    pub fn metadata_doc(&self, kind: MetadataKind, technical_name: &str) -> PathBuf {
        self.root
            .join("metadata")
            .join(kind.dir_name())
            .join(format!("{technical_name}.json"))
    }

    /// Compact metadata index for one kind.
    #[must_use]
    pub fn metadata_index(&self, kind: MetadataKind) -> PathBuf {
        self.root.join("metadata").join(kind.index_name())
    }

    /// CSV output path for one relation.
    #[must_use]
    pub fn csv_output(&self, relation: &str) -> PathBuf {
        self.root.join("csv").join(format!("{relation}.csv"))
    }
}

/// The two metadata families the fetcher maintains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataKind {
    Nodes,
    Relations,
}

impl MetadataKind {
    #[must_use]
    pub const fn dir_name(self) -> &'static str {
        match self {
            Self::Nodes => "nodes",
            Self::Relations => "relations",
        }
    }

    #[must_use]
    pub const fn index_name(self) -> &'static str {
        match self {
            Self::Nodes => "node_index.json",
            Self::Relations => "relation_index.json",
        }
    }
}

/// Fail fast if a required input file is absent.
///
/// `what` names the role the file plays so the resulting message locates
/// the problem.
///
/// # Errors
///
/// [`DumpError::NotFound`] when `path` is not an existing file.
pub fn require_file(what: &'static str, path: &Path) -> Result<(), DumpError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(DumpError::NotFound {
            what,
            path: path.to_path_buf(),
        })
    }
}
