// src/commands/run.rs

//! `run`: extract and generate in one go

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use opam2buck::config::Config;
use opam2buck::package::save_snapshot;

use super::{ExtractOptions, extract_packages, write_rules};

/// Extract records from the live index and generate rules from them
///
/// With `snapshot`, the intermediate records are saved there as well.
pub fn cmd_run(
    config: &Config,
    options: &ExtractOptions<'_>,
    output: &Path,
    root: &str,
    snapshot: Option<&Path>,
    strict: bool,
) -> Result<()> {
    let switch = options
        .switch
        .context("No switch given: pass --switch or set OPAM_SWITCH_PREFIX")?;
    info!("Generating {} from switch {}", output.display(), switch.display());

    let packages = extract_packages(&config.extract, options)?;

    if let Some(path) = snapshot {
        save_snapshot(path, &packages)
            .with_context(|| format!("Failed to write snapshot {}", path.display()))?;
    }

    write_rules(&config.generate, &packages, output, switch, root, strict)
}
