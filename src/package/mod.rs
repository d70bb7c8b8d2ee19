// src/package/mod.rs

//! Normalized package records
//!
//! A `PackageRecord` is everything the rule generator needs to know about
//! one installed findlib package. Records are built once by the extractor
//! (or loaded from a snapshot) and never modified afterwards.

mod snapshot;

pub use snapshot::{PackageSet, load_snapshot, read_snapshot, save_snapshot, write_snapshot};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Library classification reported by findlib's `library_kind` variable
///
/// Ppx rewriters and derivers always carry their runtime dependencies, even
/// when the list is empty; plain libraries never do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum LibraryKind {
    #[serde(rename = "PLAIN")]
    Plain,
    #[serde(rename = "REWRITER")]
    PpxRewriter { ppx_runtime_deps: Vec<String> },
    #[serde(rename = "DERIVER")]
    PpxDeriver { ppx_runtime_deps: Vec<String> },
}

impl LibraryKind {
    /// Runtime dependencies of a ppx, `None` for plain libraries
    pub fn ppx_runtime_deps(&self) -> Option<&[String]> {
        match self {
            Self::Plain => None,
            Self::PpxRewriter { ppx_runtime_deps } | Self::PpxDeriver { ppx_runtime_deps } => {
                Some(ppx_runtime_deps)
            }
        }
    }
}

/// One installed package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    /// Canonical name (`%p`), may differ from the name it was queried by
    pub name: String,

    /// Absolute install directory (`%d`)
    pub directory: String,

    #[serde(flatten)]
    pub kind: LibraryKind,

    #[serde(default)]
    pub static_byte_libs: Vec<String>,
    #[serde(default)]
    pub static_native_libs: Vec<String>,
    #[serde(default)]
    pub dyn_byte_libs: Vec<String>,
    #[serde(default)]
    pub dyn_native_libs: Vec<String>,

    /// C libraries of the native archives, duplicates kept
    #[serde(default)]
    pub native_c_libs: Vec<String>,
    #[serde(default)]
    pub native_c_lib_paths: Vec<String>,

    /// C libraries of the bytecode archives, duplicates kept
    #[serde(default)]
    pub bytecode_c_libs: Vec<String>,
    #[serde(default)]
    pub bytecode_c_lib_paths: Vec<String>,

    /// Required packages, restricted to installed ones
    #[serde(default)]
    pub dependencies: Vec<String>,

    /// js_of_ocaml runtime files, if the package declares any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsoo_runtime: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PackageRecord {
    /// A plain record with no archives or dependencies
    pub fn new(name: impl Into<String>, directory: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            directory: directory.into(),
            kind: LibraryKind::Plain,
            static_byte_libs: Vec::new(),
            static_native_libs: Vec::new(),
            dyn_byte_libs: Vec::new(),
            dyn_native_libs: Vec::new(),
            native_c_libs: Vec::new(),
            native_c_lib_paths: Vec::new(),
            bytecode_c_libs: Vec::new(),
            bytecode_c_lib_paths: Vec::new(),
            dependencies: Vec::new(),
            jsoo_runtime: None,
            warning: None,
            error: None,
        }
    }

    /// True when the package ships any native code
    pub fn is_native(&self) -> bool {
        self.static_native_libs.len() + self.dyn_native_libs.len() > 0
    }
}

/// Remove duplicates, keeping the first occurrence of each item
pub fn unique<I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

/// Keep only names present in the installed package set
///
/// META files may reference optional dependencies that are not installed.
pub fn sanitize(installed: &HashSet<String>, names: Vec<String>) -> Vec<String> {
    names
        .into_iter()
        .filter(|name| installed.contains(name))
        .collect()
}
