#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use output::OutputMode;
use relstat_core::config;
use relstat_core::layout::DataLayout;
use std::env;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "relstat: structural statistics over bipartite relation dumps",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Data root directory (defaults to relstat.toml `root`, then `.`).
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Derive the output mode from flags.
    fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Analyze one relation and write its statistics report",
        long_about = "Analyze one relation against its two node universes: orient edges, count \
                      duplicates, summarize degrees, classify cardinality, and write the report \
                      under stats/<snapshot>/relations/.",
        after_help = "EXAMPLES:\n    # Analyze a relation for one snapshot\n    rst stats 2025-11-10 PO_je_gestor_KS PO KS\n\n    # Print the report itself\n    rst stats 2025-11-10 PO_je_gestor_KS PO KS --json"
    )]
    Stats(cmd::stats::StatsArgs),

    #[command(
        about = "Fetch node and relation type metadata from the catalog API",
        long_about = "Fetch node-type and relation-type metadata from the remote catalog with \
                      retry and exponential backoff, writing full documents and compact indexes \
                      under metadata/.",
        after_help = "EXAMPLES:\n    # Refresh all metadata\n    rst fetch --base-url https://catalog.example/api\n\n    # Node types only\n    rst fetch --nodes-only"
    )]
    Fetch(cmd::fetch::FetchArgs),

    #[command(
        about = "Convert relation TABLE dumps to CSV",
        long_about = "Convert relation TABLE dumps to semicolon-delimited, fully quoted CSV \
                      with a UTF-8 BOM, suitable for spreadsheet import.",
        after_help = "EXAMPLES:\n    # Convert one relation\n    rst convert PO_je_gestor_KS\n\n    # Convert everything under raw/relations/\n    rst convert --all"
    )]
    Convert(cmd::convert::ConvertArgs),

    #[command(
        about = "Rebuild the snapshot index over the stats directory",
        long_about = "Walk stats/ and rebuild index.json listing which snapshots, node types, \
                      and relations exist on disk.",
        after_help = "EXAMPLES:\n    rst index\n    rst index --json"
    )]
    Index(cmd::index::IndexArgs),

    #[command(about = "Generate shell completion scripts")]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("RELSTAT_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "relstat=debug,info"
        } else {
            "relstat=info,warn"
        })
    });

    let format = env::var("RELSTAT_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry.with(fmt::layer().json().with_ansi(false)).init();
        }
        _ => {
            registry.with(fmt::layer().compact()).init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let output = cli.output_mode();

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let cwd = env::current_dir()?;
    let project = config::load_project_config(&cwd)?;

    // --root wins over the project config; both fall back to the cwd.
    let root = cli
        .root
        .clone()
        .or_else(|| project.root.clone())
        .unwrap_or(cwd);
    let layout = DataLayout::new(root);

    match cli.command {
        Commands::Stats(ref args) => cmd::stats::run_stats(args, output, &layout),
        Commands::Fetch(ref args) => cmd::fetch::run_fetch(args, output, &layout, &project),
        Commands::Convert(ref args) => cmd::convert::run_convert(args, output, &layout),
        Commands::Index(ref args) => cmd::index::run_index(args, output, &layout),
        Commands::Completions(args) => {
            cmd::completions::run_completions(args.shell, &mut Cli::command())
        }
    }
}
