// src/objinfo.rs

//! C link requirements of OCaml archives
//!
//! `ocamlobjinfo` prints, among other things, a line such as
//!
//! ```text
//! Extra C object files: -lunix -L/opt/lib -lm
//! ```
//!
//! for `.cma` and `.cmxa` files. The `-l` entries are the C libraries the
//! archive must be linked with, the `-L` entries their search paths.

use std::path::{Path, PathBuf};
use tracing::warn;

use crate::process::CommandRunner;

/// C libraries and search paths declared by one or more archives
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CLibInfo {
    /// Library names with the `-l` prefix removed
    pub libs: Vec<String>,
    /// Search paths with the `-L` prefix removed
    pub paths: Vec<String>,
}

impl CLibInfo {
    /// Append another archive's information, keeping duplicates
    pub fn extend(&mut self, other: CLibInfo) {
        self.libs.extend(other.libs);
        self.paths.extend(other.paths);
    }
}

/// Parse introspection output for the C object line
///
/// Tokens that are neither `-l` nor `-L` are logged and dropped.
pub fn parse_c_objects(output: &str, marker: &str, archive: &Path) -> CLibInfo {
    let mut info = CLibInfo::default();

    for line in output.lines() {
        let Some(rest) = line.strip_prefix(marker) else {
            continue;
        };
        for entry in rest.split_whitespace() {
            if let Some(lib) = entry.strip_prefix("-l") {
                info.libs.push(lib.to_string());
            } else if let Some(path) = entry.strip_prefix("-L") {
                info.paths.push(path.to_string());
            } else {
                warn!(
                    "Unsupported Extra C object files entry in {}: {}",
                    archive.display(),
                    entry
                );
            }
        }
    }

    info
}

/// Runs the archive inspector
pub struct ObjInfo<'a> {
    tool: PathBuf,
    marker: String,
    runner: &'a dyn CommandRunner,
}

impl<'a> ObjInfo<'a> {
    pub fn new(tool: impl Into<PathBuf>, marker: impl Into<String>, runner: &'a dyn CommandRunner) -> Self {
        Self {
            tool: tool.into(),
            marker: marker.into(),
            runner,
        }
    }

    /// C link requirements of one archive
    ///
    /// If the inspector cannot be started or fails on this archive, the
    /// failure is logged and an empty result is returned.
    pub fn c_libs(&self, archive: &Path) -> CLibInfo {
        let output = match self.runner.run(&self.tool, &[archive.display().to_string()]) {
            Ok(output) => output,
            Err(e) => {
                warn!("[ocamlobjinfo] Can't run on {}: {}", archive.display(), e);
                return CLibInfo::default();
            }
        };

        if !output.success() {
            warn!("[ocamlobjinfo] Can't read {}.", archive.display());
            return CLibInfo::default();
        }

        parse_c_objects(&output.stdout, &self.marker, archive)
    }
}
