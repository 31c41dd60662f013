//! The analyzer front door: resolve paths, load dumps, orient, aggregate.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::DumpError;
use crate::layout::{DataLayout, require_file};
use crate::orient::orient_edges;
use crate::stats::{RelationStatsReport, compute_report};
use crate::table::RelationTable;
use crate::universe::NodeUniverse;

/// One analysis run: a (snapshot, relation, source type, target type) tuple.
#[derive(Debug, Clone)]
pub struct AnalyzeRequest {
    pub snapshot: String,
    pub relation: String,
    pub source_type: String,
    pub target_type: String,
}

/// Analyze one relation against its two node universes.
///
/// All three input files are existence-checked up front so a missing dump
/// fails before any computation, naming what is missing and where.
///
/// # Errors
///
/// [`DumpError::NotFound`] for absent inputs, [`DumpError::Io`] for read
/// failures, [`DumpError::Format`] for malformed documents.
pub fn analyze_relation(
    layout: &DataLayout,
    request: &AnalyzeRequest,
) -> Result<RelationStatsReport, DumpError> {
    let relation_path = layout.relation_dump(&request.relation);
    let source_path = layout.node_dump(&request.source_type);
    let target_path = layout.node_dump(&request.target_type);

    require_file("relation dump", &relation_path)?;
    require_file("source node dump", &source_path)?;
    require_file("target node dump", &target_path)?;

    let source_universe = NodeUniverse::parse(&source_path, &read(&source_path)?)?;
    let target_universe = NodeUniverse::parse(&target_path, &read(&target_path)?)?;
    let table = RelationTable::parse(&relation_path, &read(&relation_path)?)?;

    let raw = table.raw_edges();
    tracing::info!(
        relation = %request.relation,
        rows = table.row_count(),
        edges = raw.len(),
        "parsed relation table"
    );

    let edges = orient_edges(&raw, &source_universe, &target_universe);

    Ok(compute_report(
        &request.snapshot,
        &request.relation,
        &request.source_type,
        &request.target_type,
        &edges,
        source_universe.len(),
        target_universe.len(),
    ))
}

/// Write a report to its conventional location, creating parent directories.
///
/// Returns the path written.
///
/// # Errors
///
/// [`DumpError::Io`] on any filesystem failure.
pub fn write_report(
    layout: &DataLayout,
    report: &RelationStatsReport,
) -> Result<PathBuf, DumpError> {
    let path = layout.stats_report(&report.snapshot, &report.relation_name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| DumpError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let mut body = serde_json::to_string_pretty(report).map_err(|source| DumpError::Format(
        crate::error::FormatError::Json {
            path: path.clone(),
            source,
        },
    ))?;
    body.push('\n');

    fs::write(&path, body).map_err(|source| DumpError::Io {
        path: path.clone(),
        source,
    })?;

    tracing::info!(path = %path.display(), "wrote relation stats");
    Ok(path)
}

fn read(path: &Path) -> Result<String, DumpError> {
    fs::read_to_string(path).map_err(|source| DumpError::Io {
        path: path.to_path_buf(),
        source,
    })
}
