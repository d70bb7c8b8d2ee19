// src/config.rs

//! Tunable names, suffixes and allow-lists
//!
//! Every fixed name the extractor and generator rely on lives here rather
//! than in module-level constants, so callers (and tests) can substitute
//! their own values. A TOML file can override any field:
//!
//! ```toml
//! [extract]
//! exclude = ["dune.configurator", "ocaml-lsp-server"]
//!
//! [generate]
//! runtime_lib_stems = ["threads", "unix"]
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;

/// Relative root used in generated paths when none is given
pub const DEFAULT_PREFIX: &str = "opam";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub extract: ExtractorConfig,

    #[serde(default)]
    pub generate: GeneratorConfig,
}

impl Config {
    /// Load a config file, filling unspecified fields with defaults
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}

/// Settings for the metadata extractor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Package index executable
    pub findlib_tool: String,

    /// Archive introspection executable
    pub objinfo_tool: String,

    /// Predicates every query runs under (posix threads)
    pub base_predicates: String,

    /// Extra predicate added for ppx rewriters and derivers
    pub ppx_predicate: String,

    /// Predicate selecting the bytecode variant
    pub byte_predicate: String,

    /// Predicate selecting the native variant
    pub native_predicate: String,

    /// Suffix of native library archives
    pub native_archive_suffix: String,

    /// Suffix of bytecode library archives
    pub byte_archive_suffix: String,

    /// Line prefix of the C link flags in the introspection output
    pub c_objects_marker: String,

    /// Packages never extracted
    pub exclude: Vec<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            findlib_tool: "ocamlfind".to_string(),
            objinfo_tool: "ocamlobjinfo".to_string(),
            base_predicates: "mt,mt_posix".to_string(),
            ppx_predicate: "ppx_driver".to_string(),
            byte_predicate: "byte".to_string(),
            native_predicate: "native".to_string(),
            native_archive_suffix: ".cmxa".to_string(),
            byte_archive_suffix: ".cma".to_string(),
            c_objects_marker: "Extra C object files:".to_string(),
            exclude: vec!["dune.configurator".to_string()],
        }
    }
}

/// Settings for the rule generator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Library directory, relative to the switch
    pub lib_dir: String,

    /// Binary directory, relative to the switch
    pub bin_dir: String,

    /// Compiler runtime directory, relative to the switch
    pub runtime_dir: String,

    /// C library name stems that older compilers install into
    /// `runtime_dir` instead of the package directory
    pub runtime_lib_stems: Vec<String>,

    /// Binaries with these suffixes are never wrapped in `sh_binary`
    pub compiled_suffixes: Vec<String>,

    /// A binary with a sibling carrying this suffix is skipped
    pub optimized_suffix: String,

    /// Bytecode executables are exported as plain files
    pub bytecode_suffix: String,

    /// Native plugins exported per package
    pub plugin_suffix: String,

    /// Bytecode interpreter binary
    pub interpreter: String,

    /// Debugger binary, only reachable through its command alias
    pub debugger: String,

    /// Native runtime archive
    pub runtime_archive: String,

    /// Binary whose test executables share a stem
    pub format_recovery_tool: String,

    /// JS compiler binary
    pub js_compiler: String,

    /// JS runtime shipped with the compiler, relative to `lib_dir`
    pub js_runtime: String,

    /// Name of the header-only compiler library rule
    pub headers_rule: String,

    /// Name of the exported compiler include directory
    pub interop_includes_rule: String,

    /// Visibility attached to public rules
    pub visibility: Vec<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            lib_dir: "lib".to_string(),
            bin_dir: "bin".to_string(),
            runtime_dir: "lib/ocaml".to_string(),
            runtime_lib_stems: vec![
                "threads".to_string(),
                "unix".to_string(),
                "camlstr".to_string(),
                "camlruntime_events".to_string(),
            ],
            compiled_suffixes: vec![".byte".to_string(), ".native".to_string(), ".exe".to_string()],
            optimized_suffix: ".opt".to_string(),
            bytecode_suffix: ".byte".to_string(),
            plugin_suffix: ".cmxs".to_string(),
            interpreter: "ocamlrun".to_string(),
            debugger: "ocamldebug".to_string(),
            runtime_archive: "libasmrun.a".to_string(),
            format_recovery_tool: "ocamlformat.parser_recovery".to_string(),
            js_compiler: "js_of_ocaml".to_string(),
            js_runtime: "js_of_ocaml-compiler/runtime.js".to_string(),
            headers_rule: "ocaml-dev".to_string(),
            interop_includes_rule: "interop_includes".to_string(),
            visibility: vec!["PUBLIC".to_string()],
        }
    }
}

impl GeneratorConfig {
    /// Whether a C library may be looked up in the compiler runtime directory
    pub fn is_runtime_lib(&self, lib: &str) -> bool {
        self.runtime_lib_stems
            .iter()
            .any(|stem| lib.starts_with(stem.as_str()))
    }
}
