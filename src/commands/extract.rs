// src/commands/extract.rs

//! `extract`: dump package records as a JSON snapshot

use anyhow::{Context, Result};
use std::io::{self, BufWriter};
use std::path::Path;
use tracing::info;

use opam2buck::config::Config;
use opam2buck::package::{save_snapshot, write_snapshot};

use super::{ExtractOptions, extract_packages};

/// Extract records and write them to `output`, or stdout
pub fn cmd_extract(config: &Config, options: &ExtractOptions<'_>, output: Option<&Path>) -> Result<()> {
    match options.package {
        Some(package) => info!("Extracting package {}", package),
        None => info!("Extracting all installed packages"),
    }

    let packages = extract_packages(&config.extract, options)?;

    match output {
        Some(path) => save_snapshot(path, &packages)
            .with_context(|| format!("Failed to write snapshot {}", path.display()))?,
        None => write_snapshot(BufWriter::new(io::stdout().lock()), &packages)?,
    }
    Ok(())
}
