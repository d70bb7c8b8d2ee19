// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use opam2buck::{Error, Result};
use opam2buck::process::{CommandOutput, CommandRunner};
use tempfile::TempDir;

pub const BASE: &str = "mt,mt_posix";
pub const BYTE: &str = "mt,mt_posix,byte";
pub const NATIVE: &str = "mt,mt_posix,native";
pub const PPX: &str = "mt,mt_posix,ppx_driver";
pub const PPX_BYTE: &str = "mt,mt_posix,ppx_driver,byte";
pub const PPX_NATIVE: &str = "mt,mt_posix,ppx_driver,native";

/// Answers commands from a script instead of running them
///
/// Commands are keyed by program file name plus arguments. Unscripted
/// commands succeed with empty output, like a findlib query for a field the
/// META file does not set.
#[derive(Default)]
pub struct ScriptedRunner {
    answers: HashMap<Vec<String>, CommandOutput>,
    unavailable: HashSet<String>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(program: &str, args: &[&str]) -> Vec<String> {
        std::iter::once(program)
            .chain(args.iter().copied())
            .map(str::to_string)
            .collect()
    }

    /// Script a successful command
    pub fn answer(&mut self, program: &str, args: &[&str], stdout: &str) -> &mut Self {
        self.answers.insert(
            Self::key(program, args),
            CommandOutput {
                code: 0,
                stdout: stdout.to_string(),
                stderr: String::new(),
            },
        );
        self
    }

    /// Script a failing command
    pub fn fail(&mut self, program: &str, args: &[&str]) -> &mut Self {
        self.answers.insert(
            Self::key(program, args),
            CommandOutput {
                code: 2,
                stdout: String::new(),
                stderr: "error".to_string(),
            },
        );
        self
    }

    /// Make every run of a program fail to start
    pub fn unavailable(&mut self, program: &str) -> &mut Self {
        self.unavailable.insert(program.to_string());
        self
    }

    /// `ocamlfind list` output for the given packages
    pub fn list(&mut self, packages: &[&str]) -> &mut Self {
        let output: String = packages
            .iter()
            .map(|name| format!("{:<24}(version: 1.0)\n", name))
            .collect();
        self.answer("ocamlfind", &["list"], &output)
    }

    /// A findlib query without predicates
    pub fn query(&mut self, package: &str, format: &str, stdout: &str) -> &mut Self {
        self.answer("ocamlfind", &["query", "-format", format, package], stdout)
    }

    /// A findlib query under predicates
    pub fn query_with(&mut self, package: &str, predicates: &str, format: &str, stdout: &str) -> &mut Self {
        self.answer(
            "ocamlfind",
            &["query", "-predicates", predicates, "-format", format, package],
            stdout,
        )
    }

    /// Name and directory of a package
    pub fn package(&mut self, package: &str, directory: &str) -> &mut Self {
        self.query(package, "%p", package).query(package, "%d", directory)
    }

    /// The C object line `ocamlobjinfo` prints for an archive
    pub fn c_objects(&mut self, archive: &str, flags: &str) -> &mut Self {
        self.answer(
            "ocamlobjinfo",
            &[archive],
            &format!("File {}\nExtra C object files: {}\nExtra C options:\n", archive, flags),
        )
    }

    /// Every command run so far, program file name first
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    /// How often a command was run
    pub fn count(&self, program: &str, args: &[&str]) -> usize {
        let key = Self::key(program, args);
        self.calls().iter().filter(|call| **call == key).count()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, program: &Path, args: &[String]) -> Result<CommandOutput> {
        let mut key = vec![
            program
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
        ];
        key.extend(args.iter().cloned());
        self.calls.lock().unwrap().push(key.clone());

        if self.unavailable.contains(&key[0]) {
            return Err(Error::ToolError {
                tool: program.display().to_string(),
                reason: "No such file or directory (os error 2)".to_string(),
            });
        }

        Ok(self.answers.get(&key).cloned().unwrap_or_default())
    }
}

/// An opam switch laid out in a temporary directory
///
/// The switch itself is `<tmp>/myswitch` so that record directories can
/// name it.
pub struct SwitchFixture {
    _root: TempDir,
    path: PathBuf,
}

impl SwitchFixture {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().join("myswitch");
        fs::create_dir_all(path.join("bin")).unwrap();
        fs::create_dir_all(path.join("lib/ocaml")).unwrap();
        Self { _root: root, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Absolute path of a switch-relative location, as findlib reports it
    pub fn dir(&self, relative: &str) -> String {
        self.path.join(relative).display().to_string()
    }

    /// Create an empty file at a switch-relative path
    pub fn touch(&self, relative: &str) -> &Self {
        let file = self.path.join(relative);
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(file, b"").unwrap();
        self
    }
}
