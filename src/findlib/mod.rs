// src/findlib/mod.rs

//! Query installed packages through `ocamlfind`
//!
//! This module wraps the two findlib operations the extractor needs:
//! listing every package and querying formatted fields of one package,
//! optionally under predicates and optionally recursive.
//!
//! A failing query is not an error: findlib exits non-zero for packages with
//! broken META files, and we treat that the same as an empty answer.

mod fields;

pub use fields::{add_predicate, parse_package_list, split_list, split_words};

use std::path::PathBuf;
use tracing::{debug, warn};

use crate::error::Result;
use crate::process::CommandRunner;

/// A findlib query against one package
#[derive(Debug, Clone, Default)]
pub struct Query<'q> {
    pub package: &'q str,
    pub format: &'q str,
    pub predicates: &'q str,
    pub recursive: bool,
}

impl<'q> Query<'q> {
    /// Query `format` for `package` with no predicates
    pub fn new(package: &'q str, format: &'q str) -> Self {
        Self {
            package,
            format,
            predicates: "",
            recursive: false,
        }
    }

    /// Run the query under the given comma-separated predicates
    pub fn predicates(mut self, predicates: &'q str) -> Self {
        self.predicates = predicates;
        self
    }

    /// Resolve the field through the package's requirements too
    pub fn recursive(mut self) -> Self {
        self.recursive = true;
        self
    }

    fn to_args(&self) -> Vec<String> {
        let mut args = vec!["query".to_string()];
        if self.recursive {
            args.push("-recursive".to_string());
        }
        if !self.predicates.is_empty() {
            args.push("-predicates".to_string());
            args.push(self.predicates.to_string());
        }
        args.push("-format".to_string());
        args.push(self.format.to_string());
        args.push(self.package.to_string());
        args
    }
}

/// Format string for a META variable, e.g. `%(requires)`
pub fn variable_format(variable: &str) -> String {
    format!("%({})", variable)
}

/// Client for the findlib command-line tool
pub struct Findlib<'a> {
    tool: PathBuf,
    runner: &'a dyn CommandRunner,
}

impl<'a> Findlib<'a> {
    pub fn new(tool: impl Into<PathBuf>, runner: &'a dyn CommandRunner) -> Self {
        Self {
            tool: tool.into(),
            runner,
        }
    }

    /// Run findlib with raw arguments, returning trimmed stdout
    ///
    /// Returns an empty string when findlib exits non-zero.
    fn call(&self, args: &[String]) -> Result<String> {
        let output = self.runner.run(&self.tool, args)?;
        if !output.success() {
            warn!(
                "Invalid cmd: {} (exit code {}): {}",
                args.join(" "),
                output.code,
                output.stderr.trim()
            );
            return Ok(String::new());
        }
        Ok(output.stdout.trim().to_string())
    }

    /// List all installed package names, sub-packages included
    pub fn list(&self) -> Result<Vec<String>> {
        debug!("Listing findlib packages");
        let output = self.call(&["list".to_string()])?;
        let packages = parse_package_list(&output);
        debug!("Found {} findlib packages", packages.len());
        Ok(packages)
    }

    /// Run a formatted query, returning the raw trimmed answer
    pub fn query(&self, query: &Query<'_>) -> Result<String> {
        self.call(&query.to_args())
    }

    /// Run a formatted query and split the answer as a list field
    pub fn query_list(&self, query: &Query<'_>) -> Result<Vec<String>> {
        Ok(split_list(&self.query(query)?))
    }

    /// Canonical package name (`%p`)
    pub fn package_name(&self, package: &str) -> Result<String> {
        self.query(&Query::new(package, "%p"))
    }

    /// Install directory (`%d`)
    pub fn package_directory(&self, package: &str) -> Result<String> {
        self.query(&Query::new(package, "%d"))
    }

    /// Archive files (`%a`) under the given predicates
    pub fn archives(&self, package: &str, predicates: &str) -> Result<Vec<String>> {
        self.query_list(&Query::new(package, "%a").predicates(predicates))
    }

    /// A META variable as a list
    pub fn variable(
        &self,
        package: &str,
        variable: &str,
        predicates: &str,
        recursive: bool,
    ) -> Result<Vec<String>> {
        let format = variable_format(variable);
        let mut query = Query::new(package, &format).predicates(predicates);
        if recursive {
            query = query.recursive();
        }
        self.query_list(&query)
    }

    /// A META variable as raw text
    pub fn variable_text(&self, package: &str, variable: &str, predicates: &str) -> Result<String> {
        let format = variable_format(variable);
        self.query(&Query::new(package, &format).predicates(predicates))
    }

    /// Plugin archives (`%(plugin)`) under the given predicates
    pub fn plugins(&self, package: &str, predicates: &str) -> Result<Vec<String>> {
        self.variable(package, "plugin", predicates, false)
    }
}
