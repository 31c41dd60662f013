//! `rst index` — rebuild the snapshot index over the stats directory.
//!
//! Each directory under `stats/` is one snapshot; its `attributes/` and
//! `relations/` subdirectories list which node-type and relation reports
//! exist. Snapshots carrying neither are omitted from the index.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDate;
use clap::Args;
use relstat_core::layout::DataLayout;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::output::{OutputMode, render};

/// Arguments for `rst index`.
#[derive(Args, Debug, Default)]
pub struct IndexArgs {}

#[derive(Debug, Serialize)]
struct SnapshotEntry {
    date: String,
    node_types: Vec<String>,
    relations: Vec<String>,
}

#[derive(Debug, Serialize)]
struct StatsIndex {
    snapshots: Vec<SnapshotEntry>,
}

/// Report payload for `rst index`.
#[derive(Debug, Serialize)]
struct IndexReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<PathBuf>,
    snapshots: usize,
}

/// Execute `rst index`.
pub fn run_index(_args: &IndexArgs, output: OutputMode, layout: &DataLayout) -> anyhow::Result<()> {
    let stats_root = layout.stats_root();
    if !stats_root.is_dir() {
        info!(path = %stats_root.display(), "stats directory does not exist, nothing to index");
        return render(
            output,
            &IndexReport {
                path: None,
                snapshots: 0,
            },
            |_, w| {
                use std::io::Write;
                writeln!(w, "{} does not exist, nothing to index", stats_root.display())
            },
        );
    }

    let index = build_index(&stats_root)?;

    let index_path = layout.stats_index();
    let mut body = serde_json::to_string_pretty(&index)?;
    body.push('\n');
    fs::write(&index_path, body)
        .with_context(|| format!("Failed to write {}", index_path.display()))?;

    let report = IndexReport {
        path: Some(index_path),
        snapshots: index.snapshots.len(),
    };

    render(output, &report, |report, w| {
        use std::io::Write;
        writeln!(
            w,
            "Wrote {} with {} snapshot(s)",
            report.path.as_deref().unwrap_or(Path::new("?")).display(),
            report.snapshots
        )
    })
}

fn build_index(stats_root: &Path) -> anyhow::Result<StatsIndex> {
    let mut snapshots = Vec::new();

    for entry in fs::read_dir(stats_root)
        .with_context(|| format!("Failed to list {}", stats_root.display()))?
    {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        let Some(date) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        let node_types = json_stems(&path.join("attributes"));
        if node_types.is_empty() {
            warn!(snapshot = date, "no attributes/ directory, no node stats");
        }

        let relations = json_stems(&path.join("relations"));
        if relations.is_empty() {
            debug!(snapshot = date, "no relations/ directory, no relation stats");
        }

        if node_types.is_empty() && relations.is_empty() {
            continue;
        }

        snapshots.push(SnapshotEntry {
            date: date.to_string(),
            node_types,
            relations,
        });
    }

    // Dated snapshots first in chronological order, anything non-date-shaped
    // after them lexically.
    snapshots.sort_by(|a, b| {
        let da = NaiveDate::parse_from_str(&a.date, "%Y-%m-%d").ok();
        let db = NaiveDate::parse_from_str(&b.date, "%Y-%m-%d").ok();
        match (da, db) {
            (Some(da), Some(db)) => da.cmp(&db),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.date.cmp(&b.date),
        }
    });

    Ok(StatsIndex { snapshots })
}

/// Sorted `*.json` stems in `dir`; empty when the directory is absent.
fn json_stems(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut stems: Vec<String> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(String::from))
        .collect();
    stems.sort();
    stems
}

#[cfg(test)]
mod tests {
    use super::build_index;
    use std::fs;
    use std::path::Path;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(path, "{}").expect("write");
    }

    #[test]
    fn snapshots_sorted_by_date_then_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(dir.path(), "2025-11-10/relations/R1.json");
        touch(dir.path(), "2025-01-02/relations/R1.json");
        touch(dir.path(), "experimental/relations/R1.json");

        let index = build_index(dir.path()).expect("index builds");
        let dates: Vec<_> = index.snapshots.iter().map(|s| s.date.as_str()).collect();
        assert_eq!(dates, vec!["2025-01-02", "2025-11-10", "experimental"]);
    }

    #[test]
    fn empty_snapshots_are_omitted() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(dir.path().join("2025-11-10")).expect("mkdir");
        touch(dir.path(), "2025-11-11/attributes/KS.json");

        let index = build_index(dir.path()).expect("index builds");
        assert_eq!(index.snapshots.len(), 1);
        assert_eq!(index.snapshots[0].date, "2025-11-11");
        assert_eq!(index.snapshots[0].node_types, vec!["KS"]);
        assert!(index.snapshots[0].relations.is_empty());
    }

    #[test]
    fn stems_are_sorted_and_non_json_ignored() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(dir.path(), "2025-11-10/relations/Z_rel.json");
        touch(dir.path(), "2025-11-10/relations/A_rel.json");
        touch(dir.path(), "2025-11-10/relations/notes.txt");

        let index = build_index(dir.path()).expect("index builds");
        assert_eq!(index.snapshots[0].relations, vec!["A_rel", "Z_rel"]);
    }
}
