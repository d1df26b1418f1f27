//! permbench binary
//!
//! Compares relationship-tuple permission checks against a flattened ACL.
//!
//! # Usage
//!
//! ```bash
//! # Generate a corpus
//! permbench --config config.yaml generate --out corpus.json
//!
//! # Benchmark both engines on it
//! permbench --config config.yaml bench --corpus corpus.json --output report.json
//!
//! # With environment variables only
//! PERMBENCH_CORPUS__USERS=5000 permbench bench
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;

use permbench_cli::commands;
use permbench_cli::observability::{init_logging, LoggingConfig};

/// Tuple graph vs. flattened ACL permission benchmark
#[derive(Parser, Debug)]
#[command(name = "permbench")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Generate a fixture corpus
    Generate {
        /// Corpus output file (defaults to output.corpus_path)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Benchmark both engines on a corpus
    Bench {
        /// Corpus file; generated when missing (defaults to output.corpus_path)
        #[arg(long)]
        corpus: Option<PathBuf>,

        /// Report output file (defaults to output.report_path)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = commands::load_config(cli.config.as_deref())?;
    init_logging(&LoggingConfig::from_settings(&config.logging));

    info!(version = env!("CARGO_PKG_VERSION"), "Starting permbench");

    match cli.command {
        Command::Generate { out } => {
            let path = commands::generate(&config, out)?;
            println!("{}", path.display());
        }
        Command::Bench { corpus, output } => {
            let report = commands::bench(&config, corpus, output).await?;
            println!("{}", serde_json::to_string_pretty(&report.records)?);
        }
    }

    Ok(())
}
