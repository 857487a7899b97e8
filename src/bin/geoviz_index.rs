//! Index builder CLI
//!
//! Walks a code-samples tree or an API reference tree and writes the
//! search-ready records as one JSON array, either replacing the output
//! file or appending to its existing records.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;

use geoviz_ai::indexer::{collect_docs, collect_samples};

/// Build search-index records from Azure Maps code samples and API
/// reference docs.
#[derive(Parser, Debug)]
#[command(name = "geoviz-index", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert HTML code samples into search records.
    Samples {
        /// Root directory of the code samples tree.
        #[arg(short, long)]
        dir: PathBuf,

        /// Output JSON file.
        #[arg(short, long, default_value = "azmaps_code_samples.json")]
        out: PathBuf,

        /// Append to the output file instead of replacing it.
        #[arg(long)]
        append: bool,
    },
    /// Convert YAML API reference docs into search records.
    Docs {
        /// Root directory of the reference docs tree.
        #[arg(short, long)]
        dir: PathBuf,

        /// Output JSON file.
        #[arg(short, long, default_value = "azmaps_reference_docs.json")]
        out: PathBuf,

        /// Append to the output file instead of replacing it.
        #[arg(long)]
        append: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "geoviz_ai=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Samples { dir, out, append } => {
            let records = collect_samples(&dir)
                .with_context(|| format!("failed to walk samples tree {}", dir.display()))?;
            tracing::info!(count = records.len(), "Built code sample records");
            write_records(&out, &records, append)
        }
        Command::Docs { dir, out, append } => {
            let records = collect_docs(&dir)
                .with_context(|| format!("failed to walk reference tree {}", dir.display()))?;
            tracing::info!(count = records.len(), "Built reference records");
            write_records(&out, &records, append)
        }
    }
}

fn write_records<T: Serialize>(out: &Path, records: &[T], append: bool) -> anyhow::Result<()> {
    let mut all: Vec<serde_json::Value> = records
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<_, _>>()?;

    if append && out.exists() {
        let existing: Vec<serde_json::Value> =
            serde_json::from_str(&std::fs::read_to_string(out)?)
                .with_context(|| format!("existing record file {} is not a JSON array", out.display()))?;
        all.extend(existing);
    }

    std::fs::write(out, serde_json::to_string_pretty(&all)?)
        .with_context(|| format!("failed to write {}", out.display()))?;
    tracing::info!(file = %out.display(), count = all.len(), "Wrote record file");
    Ok(())
}
