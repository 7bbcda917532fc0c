//! Extract an ACPI table from a compiled firmware image.

use std::path::PathBuf;

use acpigen::extract::{self, Markers};
use acpigen::logger::{self, Verbosity};
use acpigen::write_table;
use anyhow::{Context, Result};
use clap::Parser;

/// Copy the table between the start and end markers out of a binary.
#[derive(Parser)]
#[command(name = "acpi-extract", version, about)]
struct Cli {
    /// Compiled object or firmware image holding the table.
    input: PathBuf,

    /// Output file, or a directory to place `<signature>.aml` in.
    /// Defaults to `<signature>.aml` in the current directory.
    output: Option<PathBuf>,

    /// Marker preceding the table (default `ACPI_TABLE_START`).
    #[arg(long)]
    start_magic: Option<String>,

    /// Marker following the table (default `ACPI_TABLE_END!!`).
    #[arg(long)]
    end_magic: Option<String>,

    /// Only report errors and the final result.
    #[arg(long, short = 'q', conflicts_with = "verbose")]
    quiet: bool,

    /// Show marker positions and checksum updates.
    #[arg(long, short = 'v')]
    verbose: bool,
}

impl Cli {
    fn markers(&self) -> Result<Markers> {
        let defaults = Markers::default();
        let start = self
            .start_magic
            .as_ref()
            .map_or_else(|| defaults.start().to_vec(), |s| s.as_bytes().to_vec());
        let end = self
            .end_magic
            .as_ref()
            .map_or_else(|| defaults.end().to_vec(), |s| s.as_bytes().to_vec());
        Ok(Markers::new(start, end)?)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init(Verbosity::from_flags(cli.quiet, cli.verbose));

    let image =
        std::fs::read(&cli.input).with_context(|| format!("reading {}", cli.input.display()))?;
    let table = extract::extract(&image, &cli.markers()?)
        .with_context(|| format!("extracting table from {}", cli.input.display()))?;

    let path = extract::output_path(cli.output.as_deref(), &table);
    write_table(&path, &table.bytes)?;
    println!("Table {} extracted to: {}", table.signature(), path.display());
    Ok(())
}
