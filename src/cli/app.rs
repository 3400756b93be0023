//! Main CLI application structure

use anyhow::{bail, Result};
use clap::Parser;
use std::path::PathBuf;

use super::output::{Output, OutputFormat};
use super::process::{self, Destination, Options};
use crate::domain::GroupMode;

#[derive(Parser)]
#[command(name = "stepsort")]
#[command(author, version, about = "Re-order and re-number STEP entity records")]
pub struct Cli {
    /// Input STEP file or directory
    pub input: PathBuf,

    /// Output file or directory; defaults to a `_sorted` sibling
    pub output: Option<PathBuf>,

    /// Overwrite the original file(s)
    #[arg(long)]
    pub in_place: bool,

    /// Same-kind clustering policy
    #[arg(long, value_enum, default_value = "strict")]
    pub group: GroupMode,

    /// Keep original identifiers (forward references are still removed)
    #[arg(long)]
    pub no_renum: bool,

    /// Write all processed files under this directory, preserving the
    /// relative sub-folder structure (overrides other destinations)
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', default_value = "text")]
    pub format: OutputFormat,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(cli.format, cli.verbose);

    let files = if cli.input.is_file() {
        vec![cli.input.clone()]
    } else if cli.input.is_dir() {
        process::discover(&cli.input)
    } else {
        bail!("Input path {} does not exist", cli.input.display());
    };

    if files.is_empty() {
        bail!("No STEP files found under {}", cli.input.display());
    }

    // Mirroring is relative to the scanned directory, or to the
    // containing directory for a single-file input
    let root = if cli.input.is_file() {
        cli.input.parent().map(PathBuf::from).unwrap_or_default()
    } else {
        cli.input.clone()
    };

    let dest = if let Some(dir) = &cli.out_dir {
        Destination::MirrorInto(dir.clone())
    } else if cli.in_place {
        Destination::InPlace
    } else if let Some(out) = &cli.output {
        if out.is_dir() || files.len() > 1 {
            Destination::MirrorInto(out.clone())
        } else {
            Destination::Single(out.clone())
        }
    } else {
        Destination::SortedSibling
    };

    let opts = Options {
        group: cli.group,
        renumber: !cli.no_renum,
    };

    output.verbose(&format!(
        "Processing {} file(s), group={:?}, renumber={}",
        files.len(),
        opts.group,
        opts.renumber
    ));

    let mut failed = 0usize;
    for src in &files {
        let result = dest
            .resolve(src, &root)
            .and_then(|dst| process::process_file(src, &dst, opts).map(|report| (dst, report)));

        match result {
            Ok((dst, report)) => {
                if !report.cycles.is_empty() {
                    output.warn(&format!(
                        "{}: dependency cycle involving {} record(s): {}",
                        src.display(),
                        report.cycles.len(),
                        format_ids(&report.cycles)
                    ));
                }

                if output.is_json() {
                    output.data(&serde_json::json!({
                        "file": src.display().to_string(),
                        "output": dst.display().to_string(),
                        "records": report.records,
                        "cycles": report.cycles,
                    }));
                } else {
                    output.success(&format!(
                        "{} -> {} ({} records)",
                        src.display(),
                        dst.display(),
                        report.records
                    ));
                }
            }
            Err(e) => {
                failed += 1;
                output.error(&format!("Skipping {}: {:#}", src.display(), e));
            }
        }
    }

    if output.is_json() {
        output.data(&serde_json::json!({
            "processed": files.len() - failed,
            "failed": failed,
        }));
    } else if files.len() > 1 {
        output.success(&format!(
            "Processed {} file(s), {} failed",
            files.len() - failed,
            failed
        ));
    }

    if failed > 0 {
        bail!("{} of {} file(s) failed", failed, files.len());
    }

    Ok(())
}

/// `#1, #2, #3` listing for cycle warnings
fn format_ids(ids: &[crate::domain::RecordId]) -> String {
    ids.iter()
        .map(|id| format!("#{id}"))
        .collect::<Vec<_>>()
        .join(", ")
}
