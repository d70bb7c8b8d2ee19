// src/error.rs

//! Error types for opam2buck
//!
//! Fatal conditions carry a stable process exit status so that calling
//! automation can tell them apart. Recoverable conditions (missing C
//! libraries, introspection failures) never surface here; they are logged
//! where they happen.

use thiserror::Error;

/// Errors produced while extracting package records or generating rules
#[derive(Debug, Error)]
pub enum Error {
    /// The index reported a `library_kind` we do not know about
    #[error("Invalid library_kind for package '{package}': {kind}")]
    InvalidLibraryKind { package: String, kind: String },

    /// The same package name appeared twice in one extraction batch
    #[error("Duplicated package info: {0}")]
    DuplicatePackage(String),

    /// More than one native archive survived the on-disk check
    #[error("Too many native libs for package {package}: {}", archives.join(", "))]
    TooManyNativeLibs { package: String, archives: Vec<String> },

    /// More than one bytecode archive survived the on-disk check
    #[error("Too many bytecode libs for package {package}: {}", archives.join(", "))]
    TooManyBytecodeLibs { package: String, archives: Vec<String> },

    /// A package directory does not live under the switch
    #[error("Directory '{directory}' is not inside switch '{switch}'")]
    OutsideStore { directory: String, switch: String },

    /// Two generated rules share a name (strict mode only)
    #[error("Duplicate rule name: {0}")]
    DuplicateRuleName(String),

    /// An external tool could not be started
    #[error("Failed to run {tool}: {reason}")]
    ToolError { tool: String, reason: String },

    /// Snapshot could not be encoded or decoded
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// Config file could not be parsed
    #[error("Failed to parse config file: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for opam2buck operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Process exit status for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidLibraryKind { .. } => 10,
            Self::DuplicatePackage(_) => 11,
            Self::TooManyNativeLibs { .. } => 12,
            Self::TooManyBytecodeLibs { .. } => 13,
            Self::OutsideStore { .. } => 14,
            Self::DuplicateRuleName(_) => 15,
            Self::ToolError { .. } | Self::Snapshot(_) | Self::Config(_) | Self::Io(_) => 1,
        }
    }
}
