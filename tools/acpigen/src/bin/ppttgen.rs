//! Build-time PPTT generator.
//!
//! Builds the processor topology table of one platform in memory and writes
//! it in a single call. Nothing is written if the build fails.

use std::path::PathBuf;

use acpigen::logger::{self, Verbosity};
use acpigen::summary::TopologySummary;
use acpigen::write_table;
use acpigen_tables::{SdtHeader, build_pptt};
use acpigen_topology::{Platform, registry};
use anyhow::{Context, Result, bail};
use clap::Parser;
use log::info;

/// Generate a PPTT (processor properties topology table).
#[derive(Parser)]
#[command(name = "ppttgen", version, about)]
struct Cli {
    /// Built-in platform to generate for (see `--list-platforms`).
    #[arg(
        long,
        short = 'p',
        conflicts_with = "config",
        required_unless_present_any = ["config", "list_platforms"]
    )]
    platform: Option<String>,

    /// Platform description file (TOML) to generate for.
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Output file.
    #[arg(long, short = 'o', default_value = "PPTT.aml")]
    output: PathBuf,

    /// List the built-in platforms and exit.
    #[arg(long)]
    list_platforms: bool,

    /// Only report errors and the final result.
    #[arg(long, short = 'q', conflicts_with = "verbose")]
    quiet: bool,

    /// Log every emitted record and backfilled reference.
    #[arg(long, short = 'v')]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init(Verbosity::from_flags(cli.quiet, cli.verbose));

    if cli.list_platforms {
        return list_platforms();
    }

    let platform = load_platform(&cli)?;
    info!("Initializing PPTT table for {}...", platform.name);
    let table = build_pptt(&platform)
        .with_context(|| format!("generating PPTT for {}", platform.name))?;

    if !cli.quiet {
        println!("{}", TopologySummary::new(&platform, table.len()));
    }

    write_table(&cli.output, &table)?;
    println!(
        "Successfully generated {} ({} bytes)",
        cli.output.display(),
        table.len()
    );
    println!("Checksum: 0x{:02X}", table[SdtHeader::CHECKSUM_OFFSET]);
    Ok(())
}

fn list_platforms() -> Result<()> {
    for name in registry::builtin_names() {
        let platform = registry::builtin(name)?;
        println!("{name:<8} {}", platform.description);
    }
    Ok(())
}

fn load_platform(cli: &Cli) -> Result<Platform> {
    match (&cli.platform, &cli.config) {
        (Some(name), _) => registry::builtin(name)
            .with_context(|| format!("loading platform {name} (see --list-platforms)")),
        (None, Some(path)) => {
            let doc = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            Platform::from_toml_str(&doc).with_context(|| format!("loading {}", path.display()))
        }
        (None, None) => bail!("either --platform or --config is required"),
    }
}
