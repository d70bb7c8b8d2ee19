// src/rules/writer.rs

//! BUCK file serialization
//!
//! Every rule is written as a guarded Starlark call so the generated file is
//! a no-op on Windows hosts:
//!
//! ```text
//! # buildifier: disable=no-effect
//! export_file(
//!     name = "ocamlrun",
//!     src = "opam/bin/ocamlrun",
//! ) if not host_info().os.is_windows else None
//! ```
//!
//! `TargetsFile` writes into a temporary file next to the destination and
//! moves it into place only when generation finished without error.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

use super::{Rule, Value};
use crate::error::Result;

const INDENT: &str = "    ";

/// Quote a Starlark string literal
fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

/// Serializes rules onto any writer
pub struct RuleWriter<W: Write> {
    out: W,
    rules_written: usize,
}

impl<W: Write> RuleWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            rules_written: 0,
        }
    }

    /// Number of rules written so far
    pub fn rules_written(&self) -> usize {
        self.rules_written
    }

    /// Write one rule block
    pub fn write_rule(&mut self, rule: &Rule) -> io::Result<()> {
        writeln!(self.out, "# buildifier: disable=no-effect")?;
        writeln!(self.out, "{}(", rule.function())?;
        for (name, value) in rule.attributes() {
            self.write_attribute(name, &value)?;
        }
        writeln!(self.out, ") if not host_info().os.is_windows else None")?;
        writeln!(self.out)?;
        self.rules_written += 1;
        Ok(())
    }

    /// Write all rules in order
    pub fn write_rules<'r>(&mut self, rules: impl IntoIterator<Item = &'r Rule>) -> io::Result<()> {
        for rule in rules {
            self.write_rule(rule)?;
        }
        Ok(())
    }

    fn write_attribute(&mut self, name: &str, value: &Value) -> io::Result<()> {
        match value {
            Value::Str(s) => writeln!(self.out, "{INDENT}{} = {},", name, quote(s)),
            Value::Bool(b) => writeln!(
                self.out,
                "{INDENT}{} = {},",
                name,
                if *b { "True" } else { "False" }
            ),
            Value::Null => writeln!(self.out, "{INDENT}{} = None,", name),
            Value::List(items) => {
                writeln!(self.out, "{INDENT}{} = [", name)?;
                for item in items {
                    writeln!(self.out, "{INDENT}{INDENT}{},", quote(item))?;
                }
                writeln!(self.out, "{INDENT}],")
            }
        }
    }

    /// Flush and return the underlying writer
    pub fn into_inner(mut self) -> io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

/// A BUCK file replaced atomically on commit
///
/// Creating a `TargetsFile` truncates the destination, so a failed run never
/// leaves stale rules from an earlier one behind. Rules go to a temporary
/// file in the same directory, which `commit` renames over the destination.
pub struct TargetsFile {
    path: PathBuf,
    writer: RuleWriter<BufWriter<NamedTempFile>>,
}

impl TargetsFile {
    pub fn create(path: &Path) -> Result<Self> {
        File::create(path)?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let temp = NamedTempFile::new_in(dir)?;
        debug!("Writing rules for {} via {}", path.display(), temp.path().display());

        Ok(Self {
            path: path.to_path_buf(),
            writer: RuleWriter::new(BufWriter::new(temp)),
        })
    }

    pub fn write_rule(&mut self, rule: &Rule) -> Result<()> {
        self.writer.write_rule(rule)?;
        Ok(())
    }

    pub fn write_rules<'r>(&mut self, rules: impl IntoIterator<Item = &'r Rule>) -> Result<()> {
        self.writer.write_rules(rules)?;
        Ok(())
    }

    /// Move the written rules into place, returning how many were written
    pub fn commit(self) -> Result<usize> {
        let count = self.writer.rules_written();
        let buffered = self.writer.into_inner()?;
        let temp = buffered.into_inner().map_err(|e| e.into_error())?;
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| e.error)?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{ExportFile, PrebuiltCxxLibrary};
    use std::fs;

    fn export(name: &str, src: &str) -> Rule {
        Rule::ExportFile(ExportFile {
            name: name.to_string(),
            src: src.to_string(),
        })
    }

    #[test]
    fn test_export_file_block() {
        let mut writer = RuleWriter::new(Vec::new());
        writer.write_rule(&export("ocamlrun", "opam/bin/ocamlrun")).unwrap();

        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(
            text,
            "# buildifier: disable=no-effect\n\
             export_file(\n\
             \x20   name = \"ocamlrun\",\n\
             \x20   src = \"opam/bin/ocamlrun\",\n\
             ) if not host_info().os.is_windows else None\n\
             \n"
        );
    }

    #[test]
    fn test_lists_and_bools() {
        let rule = Rule::PrebuiltCxxLibrary(PrebuiltCxxLibrary {
            name: "ocaml-dev".to_string(),
            header_dirs: vec!["opam/lib/ocaml".to_string()],
            header_only: true,
            visibility: vec![],
        });
        let mut writer = RuleWriter::new(Vec::new());
        writer.write_rule(&rule).unwrap();

        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert!(text.contains("    header_dirs = [\n        \"opam/lib/ocaml\",\n    ],\n"));
        assert!(text.contains("    header_only = True,\n"));
        assert!(text.contains("    visibility = [\n    ],\n"));
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("plain"), "\"plain\"");
        assert_eq!(quote("a\"b\\c"), "\"a\\\"b\\\\c\"");
    }

    #[test]
    fn test_targets_file_commit() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("BUCK");
        fs::write(&path, "stale").unwrap();

        let mut targets = TargetsFile::create(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "");

        targets.write_rule(&export("a", "opam/a")).unwrap();
        targets.write_rule(&export("b", "opam/b")).unwrap();
        assert_eq!(targets.commit().unwrap(), 2);

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.find("\"a\"").unwrap() < text.find("\"b\"").unwrap());
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_targets_file_dropped_leaves_empty() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("BUCK");
        fs::write(&path, "stale").unwrap();

        {
            let mut targets = TargetsFile::create(&path).unwrap();
            targets.write_rule(&export("a", "opam/a")).unwrap();
        }

        assert_eq!(fs::read_to_string(&path).unwrap(), "");
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
    }
}
