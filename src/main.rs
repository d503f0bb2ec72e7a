//! Main entry point for the streamzip CLI application.
//!
//! Builds a ZIP archive from the files named on the command line and writes
//! it to a file or to standard output.

use anyhow::{Context, Result};
use clap::Parser;

use streamzip::{Cli, CompressionMethod, EntrySummary, ZipBuilder};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let destination = cli.destination();
    let builder = ZipBuilder::new(cli.registry());
    let summary = builder
        .build(&destination, cli.entries(), &cli.options())
        .with_context(|| format!("failed to create {destination}"))?;

    if !cli.is_quiet() {
        for entry in &summary.entries {
            eprintln!("  adding: {} ({})", entry.name, describe(entry));
        }
        eprintln!(
            "{} files, {} written to {}",
            summary.entries.len(),
            format_size(summary.archive_size),
            destination
        );
    }

    Ok(())
}

/// `deflated 42%` / `stored 0%`, like Info-ZIP's status lines.
fn describe(entry: &EntrySummary) -> String {
    let verb = match entry.method {
        CompressionMethod::Stored => "stored".to_string(),
        CompressionMethod::Deflate => "deflated".to_string(),
        CompressionMethod::Unknown(id) => format!("method {id}"),
    };
    let saved = if entry.uncompressed_size > 0 && entry.compressed_size <= entry.uncompressed_size {
        100 - (entry.compressed_size * 100 / entry.uncompressed_size)
    } else {
        0
    };
    format!("{verb} {saved}%")
}

/// Format a byte size into a human-readable string.
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
