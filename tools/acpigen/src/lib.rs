//! Host-side ACPI table tooling.
//!
//! Two programs share this library:
//!
//! - `ppttgen` builds the PPTT of a platform and writes it as an `.aml` blob.
//! - `acpi-extract` copies a finished table out of a compiled firmware image
//!   (see [`extract`]).

pub mod extract;
pub mod logger;
pub mod summary;

use std::path::Path;

use anyhow::{Context, Result};

/// Writes a finished table to `path` in one call.
///
/// # Errors
///
/// Returns an error naming `path` if the file cannot be created or written.
pub fn write_table(path: &Path, table: &[u8]) -> Result<()> {
    std::fs::write(path, table).with_context(|| format!("writing {}", path.display()))
}
