//! `rst convert` — relation TABLE dumps to spreadsheet-friendly CSV.
//!
//! Output format: UTF-8 BOM first, semicolon delimiter, every field
//! double-quoted with embedded quotes doubled, `\n` line ends. Missing and
//! null cells become empty fields.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use relstat_core::layout::{DataLayout, require_file};
use relstat_core::table::RelationTable;
use serde::Serialize;
use tracing::warn;

use crate::output::{CliError, OutputMode, render, render_error};

/// Arguments for `rst convert`.
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Relation names to convert (omit when using --all).
    pub relations: Vec<String>,

    /// Convert every dump found under raw/relations/.
    #[arg(long, conflicts_with = "relations")]
    pub all: bool,
}

#[derive(Debug, Serialize)]
struct ConvertedFile {
    relation: String,
    path: PathBuf,
}

/// Report payload for `rst convert`.
#[derive(Debug, Serialize)]
struct ConvertReport {
    converted: Vec<ConvertedFile>,
    failed: usize,
}

/// Execute `rst convert`.
pub fn run_convert(
    args: &ConvertArgs,
    output: OutputMode,
    layout: &DataLayout,
) -> anyhow::Result<()> {
    let names = if args.all {
        scan_relation_dumps(layout)?
    } else {
        args.relations.clone()
    };

    if names.is_empty() {
        render_error(
            output,
            &CliError::with_details(
                "no relations to convert",
                "name relations on the command line or pass --all",
                "no_input",
            ),
        )?;
        anyhow::bail!("convert failed");
    }

    let mut report = ConvertReport {
        converted: Vec::new(),
        failed: 0,
    };

    for name in &names {
        match convert_one(layout, name) {
            Ok(path) => report.converted.push(ConvertedFile {
                relation: name.clone(),
                path,
            }),
            // In --all mode a bad dump should not abort the sweep;
            // explicitly named relations fail fast.
            Err(err) if args.all => {
                warn!(relation = %name, error = %err, "skipping relation");
                report.failed += 1;
            }
            Err(err) => {
                render_error(output, &CliError::new(err.to_string()))?;
                anyhow::bail!("convert failed");
            }
        }
    }

    render(output, &report, |report, w| {
        for file in &report.converted {
            writeln!(w, "Converted {} -> {}", file.relation, file.path.display())?;
        }
        if report.failed > 0 {
            writeln!(w, "{} relation(s) skipped, see warnings", report.failed)?;
        }
        Ok(())
    })
}

/// All `*.json` stems under `raw/relations/`, sorted.
fn scan_relation_dumps(layout: &DataLayout) -> anyhow::Result<Vec<String>> {
    let dir = layout.relation_dump_dir();
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut names = Vec::new();
    for entry in fs::read_dir(&dir).with_context(|| format!("Failed to list {}", dir.display()))? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "json")
            && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
        {
            names.push(stem.to_string());
        }
    }
    names.sort();
    Ok(names)
}

fn convert_one(layout: &DataLayout, relation: &str) -> anyhow::Result<PathBuf> {
    let dump_path = layout.relation_dump(relation);
    require_file("relation dump", &dump_path)?;

    let raw = fs::read_to_string(&dump_path)
        .with_context(|| format!("Failed to read {}", dump_path.display()))?;
    let table = RelationTable::parse(&dump_path, &raw)?;

    let headers = table.header_names()?;
    let rows = table.stringified_rows();

    // BOM so spreadsheet tools detect UTF-8.
    let mut body = String::from("\u{feff}");
    body.push_str(&csv_line(&headers));
    for row in &rows {
        body.push_str(&csv_line(row));
    }

    let out_path = layout.csv_output(relation);
    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(&out_path, body).with_context(|| format!("Failed to write {}", out_path.display()))?;

    Ok(out_path)
}

/// One CSV line: every field quoted, embedded quotes doubled.
fn csv_line(fields: &[String]) -> String {
    let mut line = String::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            line.push(';');
        }
        line.push('"');
        line.push_str(&field.replace('"', "\"\""));
        line.push('"');
    }
    line.push('\n');
    line
}
