//! `rst stats` — analyze one relation and write its report.

use std::io::Write;

use clap::Args;
use relstat_core::analyze::{AnalyzeRequest, analyze_relation, write_report};
use relstat_core::layout::DataLayout;
use tracing::warn;

use crate::output::{CliError, OutputMode, render, render_error};

/// Arguments for `rst stats`.
#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Snapshot date (e.g. 2025-11-10).
    pub snapshot: String,

    /// Relation dump name without path or extension (e.g. PO_je_gestor_KS).
    pub relation: String,

    /// Source node type (e.g. PO).
    pub source_type: String,

    /// Target node type (e.g. KS).
    pub target_type: String,
}

/// Execute `rst stats`.
pub fn run_stats(args: &StatsArgs, output: OutputMode, layout: &DataLayout) -> anyhow::Result<()> {
    // Snapshots are conventionally dated; odd names are allowed but noted.
    if chrono::NaiveDate::parse_from_str(&args.snapshot, "%Y-%m-%d").is_err() {
        warn!(snapshot = %args.snapshot, "snapshot is not a YYYY-MM-DD date");
    }

    let request = AnalyzeRequest {
        snapshot: args.snapshot.clone(),
        relation: args.relation.clone(),
        source_type: args.source_type.clone(),
        target_type: args.target_type.clone(),
    };

    let report = match analyze_relation(layout, &request) {
        Ok(report) => report,
        Err(err) => {
            render_error(output, &CliError::from(&err))?;
            anyhow::bail!("stats failed");
        }
    };

    let path = match write_report(layout, &report) {
        Ok(path) => path,
        Err(err) => {
            render_error(output, &CliError::from(&err))?;
            anyhow::bail!("stats failed");
        }
    };

    render(output, &report, |report, w| {
        writeln!(w, "Wrote relation stats to {}", path.display())?;
        writeln!(
            w,
            "  edges: {} total, {} unique, {} duplicate, {} ambiguous",
            report.edges.total_edges,
            report.edges.unique_pairs,
            report.edges.duplicate_edges,
            report.edges.ambiguous_pairs
        )?;
        writeln!(
            w,
            "  {}: {}/{} connected, {}: {}/{} connected",
            report.source_type,
            report.source.connected_nodes,
            report.source.total_nodes,
            report.target_type,
            report.target.connected_nodes,
            report.target.total_nodes
        )?;
        writeln!(w, "  cardinality: {}", report.cardinality)
    })
}
