// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common argument: switch directory
fn switch_arg() -> Arg {
    Arg::new("switch")
        .short('s')
        .long("switch")
        .value_name("SWITCH")
        .env("OPAM_SWITCH_PREFIX")
        .help("opam switch directory")
}

/// Common argument: switch location in the build tree
fn root_arg() -> Arg {
    Arg::new("root")
        .short('r')
        .long("root")
        .default_value("opam")
        .help("Location of the switch relative to the BUCK file")
}

fn strict_arg() -> Arg {
    Arg::new("strict")
        .long("strict")
        .action(ArgAction::SetTrue)
        .help("Fail on duplicate rule names")
}

fn extract_args(cmd: Command) -> Command {
    cmd.arg(switch_arg())
        .arg(Arg::new("package").short('p').long("package").help("Only extract this package"))
        .arg(
            Arg::new("exclude")
                .short('e')
                .long("exclude")
                .num_args(1..)
                .value_name("PKG")
                .help("Packages to leave out"),
        )
        .arg(
            Arg::new("jobs")
                .short('j')
                .long("jobs")
                .default_value("1")
                .help("Packages extracted in parallel"),
        )
}

fn build_cli() -> Command {
    Command::new("opam2buck")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Generate Buck2 rules for the packages of an opam switch")
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Log debug output"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .action(ArgAction::SetTrue)
                .help("Only log errors"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .help("TOML file overriding the built-in names and suffixes"),
        )
        .subcommand(extract_args(
            Command::new("extract")
                .about("Query the package index and write package records as JSON")
                .arg(Arg::new("output").short('o').long("output").help("Snapshot file (default: stdout)")),
        ))
        .subcommand(
            Command::new("generate")
                .about("Write a BUCK file from a JSON snapshot")
                .arg(Arg::new("input").short('i').long("input").required(true).help("Snapshot written by extract"))
                .arg(Arg::new("output").short('o').long("output").required(true).help("BUCK file to write"))
                .arg(switch_arg().required(true))
                .arg(root_arg())
                .arg(strict_arg()),
        )
        .subcommand(extract_args(
            Command::new("run")
                .about("Extract and generate in one step")
                .arg(Arg::new("output").short('o').long("output").required(true).help("BUCK file to write"))
                .arg(root_arg())
                .arg(Arg::new("snapshot").long("snapshot").help("Also save the package records here"))
                .arg(strict_arg()),
        ))
        .subcommand(
            Command::new("completions")
                .about("Generate shell completions")
                .arg(Arg::new("shell").required(true).help("Shell to generate completions for")),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("opam2buck.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
