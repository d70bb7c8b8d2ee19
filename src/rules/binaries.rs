// src/rules/binaries.rs

//! Rules for the executables in the switch's `bin` directory

use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use super::generator::Generator;
use super::paths::join;
use super::{ExportFile, Rule, ShBinary};
use crate::error::Result;

impl Generator {
    /// `sh_binary` and `export_file` rules for the switch's executables
    ///
    /// Entries are visited in name order. A tool gets an `sh_binary` unless
    /// it is a compiled variant (`.byte`, `.native`, `.exe`), a symlink, has
    /// an optimized `.opt` sibling, or is the debugger (which has its own
    /// alias in the prologue). Bytecode executables are also exported as
    /// files.
    pub fn binary_rules(&self) -> Result<Vec<Rule>> {
        let config = &self.config;
        let bin = self.switch.join(&config.bin_dir);

        let entries = match fs::read_dir(&bin) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Can't list switch binaries in {}: {}", bin.display(), e);
                return Ok(Vec::new());
            }
        };
        let mut names = Vec::new();
        for entry in entries {
            names.push(entry?.file_name().to_string_lossy().into_owned());
        }
        names.sort();

        let mut rules = Vec::new();
        for file in &names {
            let path = bin.join(file);
            let compiled = config.compiled_suffixes.iter().any(|s| file.ends_with(s.as_str()));
            let symlink = fs::symlink_metadata(&path)
                .map(|meta| meta.file_type().is_symlink())
                .unwrap_or(false);
            let optimized = bin
                .join(format!("{}{}", file, config.optimized_suffix))
                .exists();

            if !compiled && !symlink && !optimized {
                let stem = Path::new(file)
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| file.clone());

                if stem == config.debugger {
                    continue;
                }

                // Recovery parser executables share one stem
                let name = if stem == config.format_recovery_tool {
                    format!("{}-exe", file)
                } else {
                    format!("{}-exe", stem)
                };
                rules.push(Rule::ShBinary(ShBinary {
                    name,
                    main: self.prefixed(&join(&config.bin_dir, file)),
                    visibility: config.visibility.clone(),
                }));

                if stem == config.js_compiler {
                    rules.push(Rule::ExportFile(ExportFile {
                        name: format!("{}-runtime.js", stem),
                        src: self.prefixed(&join(&config.lib_dir, &config.js_runtime)),
                    }));
                }
            } else {
                debug!("Skipping binary {}", file);
            }

            if file.ends_with(config.bytecode_suffix.as_str()) {
                rules.push(Rule::ExportFile(ExportFile {
                    name: file.clone(),
                    src: self.prefixed(&join(&config.bin_dir, file)),
                }));
            }
        }

        Ok(rules)
    }
}
