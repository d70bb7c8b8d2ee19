// src/process.rs

//! External command execution
//!
//! All subprocesses (the package index and the archive inspector) go
//! through the `CommandRunner` trait so the extractor can be driven by a
//! scripted runner in tests.

use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

use crate::error::{Error, Result};

/// Captured result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, or -1 if terminated by a signal
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Returns true if the command exited with status 0
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Runs a program to completion and captures its output
///
/// A non-zero exit status is reported through `CommandOutput::code`, not as
/// an error. Only failure to start the program is an error.
pub trait CommandRunner: Send + Sync {
    fn run(&self, program: &Path, args: &[String]) -> Result<CommandOutput>;
}

/// Runs commands on the host
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &Path, args: &[String]) -> Result<CommandOutput> {
        debug!("Running {} {}", program.display(), args.join(" "));

        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|e| Error::ToolError {
                tool: program.display().to_string(),
                reason: format!("{}. Is it installed?", e),
            })?;

        Ok(CommandOutput {
            code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Locate a tool, preferring the copy installed in the switch
///
/// Falls back to a `PATH` lookup, then to the bare name (which will fail
/// with a clear error on first use).
pub fn resolve_tool(name: &str, switch: Option<&Path>) -> PathBuf {
    if let Some(switch) = switch {
        let candidate = switch.join("bin").join(name);
        if candidate.is_file() {
            return candidate;
        }
    }

    match which::which(name) {
        Ok(path) => path,
        Err(_) => PathBuf::from(name),
    }
}
