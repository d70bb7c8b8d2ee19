// src/commands/generate.rs

//! `generate`: BUCK rules from a saved snapshot

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use opam2buck::config::Config;
use opam2buck::package::load_snapshot;

use super::write_rules;

pub fn cmd_generate(
    config: &Config,
    input: &Path,
    output: &Path,
    switch: &Path,
    root: &str,
    strict: bool,
) -> Result<()> {
    info!("Generating {} from {}", output.display(), input.display());

    let packages = load_snapshot(input)
        .with_context(|| format!("Failed to read snapshot {}", input.display()))?;
    write_rules(&config.generate, &packages, output, switch, root, strict)
}
