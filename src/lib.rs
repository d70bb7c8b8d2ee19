// src/lib.rs

//! opam2buck
//!
//! Turns the findlib packages installed in an opam switch into Buck2 rules.
//!
//! # Architecture
//!
//! - Extraction: `ocamlfind` and `ocamlobjinfo` are queried once per package
//!   and the answers normalized into `PackageRecord`s
//! - Snapshot: records serialize to JSON, so extraction and generation can
//!   run on different machines
//! - Generation: records become `Rule`s with paths relative to the switch,
//!   checked against what is actually on disk
//! - Writing: rules are serialized into a BUCK file that is replaced
//!   atomically

pub mod config;
mod error;
pub mod extractor;
pub mod findlib;
pub mod objinfo;
pub mod package;
pub mod process;
pub mod progress;
pub mod rules;

pub use config::{Config, ExtractorConfig, GeneratorConfig};
pub use error::{Error, Result};
pub use extractor::Extractor;
pub use package::{LibraryKind, PackageRecord, PackageSet};
pub use progress::{LogProgress, ProgressTracker, SilentProgress};
pub use rules::{Generator, Rule, RuleWriter, TargetsFile};
