// src/cli.rs
//! CLI definitions for opam2buck
//!
//! This module contains all command-line interface definitions using clap.
//! The actual command implementations are in the `commands` module.

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use opam2buck::config::DEFAULT_PREFIX;

#[derive(Parser)]
#[command(name = "opam2buck")]
#[command(version)]
#[command(about = "Generate Buck2 rules for the packages of an opam switch", long_about = None)]
pub struct Cli {
    /// Log debug output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// TOML file overriding the built-in names and suffixes
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Package selection shared by `extract` and `run`
#[derive(Args)]
pub struct ExtractArgs {
    /// Switch whose tools are queried
    #[arg(short, long, env = "OPAM_SWITCH_PREFIX")]
    pub switch: Option<PathBuf>,

    /// Only extract this package
    #[arg(short, long)]
    pub package: Option<String>,

    /// Packages to leave out
    #[arg(short, long, num_args = 1.., value_name = "PKG")]
    pub exclude: Vec<String>,

    /// Packages extracted in parallel
    #[arg(short, long, default_value_t = 1)]
    pub jobs: usize,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Query the package index and write package records as JSON
    Extract {
        /// Snapshot file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        args: ExtractArgs,
    },

    /// Write a BUCK file from a JSON snapshot
    Generate {
        /// Snapshot written by `extract`, or a single bare package record
        #[arg(short, long)]
        input: PathBuf,

        /// BUCK file to write
        #[arg(short, long)]
        output: PathBuf,

        /// Switch the snapshot was taken from
        #[arg(short, long, env = "OPAM_SWITCH_PREFIX")]
        switch: PathBuf,

        /// Location of the switch relative to the BUCK file
        #[arg(short, long, default_value = DEFAULT_PREFIX)]
        root: String,

        /// Fail on duplicate rule names
        #[arg(long)]
        strict: bool,
    },

    /// Extract and generate in one step
    Run {
        /// BUCK file to write
        #[arg(short, long)]
        output: PathBuf,

        /// Location of the switch relative to the BUCK file
        #[arg(short, long, default_value = DEFAULT_PREFIX)]
        root: String,

        /// Also save the package records here
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Fail on duplicate rule names
        #[arg(long)]
        strict: bool,

        #[command(flatten)]
        args: ExtractArgs,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
