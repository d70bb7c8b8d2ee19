// src/commands/mod.rs
//! Command handlers for the opam2buck CLI

mod extract;
mod generate;
pub mod progress;
mod run;

pub use extract::cmd_extract;
pub use generate::cmd_generate;
pub use run::cmd_run;

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

use opam2buck::config::{Config, ExtractorConfig, GeneratorConfig};
use opam2buck::extractor::Extractor;
use opam2buck::package::PackageSet;
use opam2buck::process::SystemRunner;
use opam2buck::rules::{Generator, TargetsFile};

use progress::ProgressMode;

/// Load the config file if one was given, defaults otherwise
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(Config::default()),
    }
}

/// Which packages to extract and how
pub struct ExtractOptions<'a> {
    pub switch: Option<&'a Path>,
    pub package: Option<&'a str>,
    pub exclude: &'a [String],
    pub jobs: usize,
    pub progress: ProgressMode,
}

/// Query the switch's package index into records
fn extract_packages(config: &ExtractorConfig, options: &ExtractOptions<'_>) -> Result<PackageSet> {
    let runner = SystemRunner;
    let extractor = Extractor::new(config.clone(), &runner, options.switch);

    let installed = extractor
        .list_packages(options.exclude)
        .context("Failed to list installed packages")?;
    info!("Found {} installed packages", installed.len());
    let installed_set: HashSet<String> = installed.iter().cloned().collect();

    let names = match options.package {
        Some(package) => vec![package.to_string()],
        None => installed,
    };

    let tracker = progress::tracker(options.progress, names.len() as u64);
    let packages = extractor.extract(&names, &installed_set, options.jobs, tracker.as_ref())?;
    Ok(packages)
}

/// Generate rules for `packages` and write them to `output`
fn write_rules(
    config: &GeneratorConfig,
    packages: &PackageSet,
    output: &Path,
    switch: &Path,
    root: &str,
    strict: bool,
) -> Result<()> {
    let mut targets = TargetsFile::create(output)
        .with_context(|| format!("Failed to open {}", output.display()))?;

    let generator = Generator::new(config.clone(), switch, root).strict(strict);
    let rules = generator.generate(packages)?;
    targets.write_rules(&rules)?;

    let count = targets
        .commit()
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!("Wrote {} rules to {}", count, output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use opam2buck::package::{PackageRecord, save_snapshot};
    use std::fs;

    #[test]
    fn test_generate_failure_keeps_destination_empty() {
        let temp = tempfile::tempdir().unwrap();
        let switch = temp.path().join("myswitch");
        fs::create_dir_all(switch.join("bin")).unwrap();
        fs::create_dir_all(switch.join("lib/bad")).unwrap();
        fs::write(switch.join("lib/bad/a.cmxa"), b"").unwrap();
        fs::write(switch.join("lib/bad/b.cmxa"), b"").unwrap();

        let mut bad = PackageRecord::new("bad", switch.join("lib/bad").display().to_string());
        bad.static_native_libs = vec!["a.cmxa".to_string(), "b.cmxa".to_string()];
        let mut packages = PackageSet::new();
        packages.insert("bad", bad).unwrap();
        let snapshot = temp.path().join("packages.json");
        save_snapshot(&snapshot, &packages).unwrap();

        let out_dir = temp.path().join("out");
        fs::create_dir_all(&out_dir).unwrap();
        let output = out_dir.join("BUCK");
        fs::write(&output, "stale rules").unwrap();

        let err = cmd_generate(&Config::default(), &snapshot, &output, &switch, "opam", false).unwrap_err();

        let fatal = err
            .chain()
            .find_map(|cause| cause.downcast_ref::<opam2buck::Error>())
            .unwrap();
        assert!(matches!(fatal, opam2buck::Error::TooManyNativeLibs { package, .. } if package == "bad"));
        assert_eq!(fs::read_to_string(&output).unwrap(), "");
        // No temporary file left next to the destination
        assert_eq!(fs::read_dir(&out_dir).unwrap().count(), 1);
    }
}
