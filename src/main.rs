// src/main.rs

use anyhow::Result;
use clap::{CommandFactory, Parser};
use std::io;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands, ExtractArgs};
use commands::progress::ProgressMode;
use commands::{ExtractOptions, cmd_extract, cmd_generate, cmd_run, load_config};

fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber for logging, RUST_LOG wins over flags
    let level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(io::stderr)
        .init();

    if let Err(err) = run(cli) {
        eprintln!("Error: {:#}", err);
        let code = err
            .chain()
            .find_map(|cause| cause.downcast_ref::<opam2buck::Error>())
            .map(opam2buck::Error::exit_code)
            .unwrap_or(1);
        std::process::exit(code);
    }
}

fn extract_options<'a>(args: &'a ExtractArgs, quiet: bool) -> ExtractOptions<'a> {
    ExtractOptions {
        switch: args.switch.as_deref(),
        package: args.package.as_deref(),
        exclude: &args.exclude,
        jobs: args.jobs,
        progress: if quiet { ProgressMode::Quiet } else { ProgressMode::Auto },
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Extract { output, args } => {
            cmd_extract(&config, &extract_options(&args, cli.quiet), output.as_deref())
        }
        Commands::Generate {
            input,
            output,
            switch,
            root,
            strict,
        } => cmd_generate(&config, &input, &output, &switch, &root, strict),
        Commands::Run {
            output,
            root,
            snapshot,
            strict,
            args,
        } => cmd_run(
            &config,
            &extract_options(&args, cli.quiet),
            &output,
            &root,
            snapshot.as_deref(),
            strict,
        ),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "opam2buck", &mut io::stdout());
            Ok(())
        }
    }
}
