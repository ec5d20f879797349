//! Command-line definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Render Mustache templates against JSON or YAML data.
#[derive(Debug, Parser)]
#[command(name = "mustang", version, about)]
pub struct Cli {
    /// Increase logging verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Render a template
    Render {
        #[command(flatten)]
        input: Input,

        /// Write the output to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// List the data each top-level tag reads, one JSON object per line
    Inspect {
        #[command(flatten)]
        input: Input,
    },
}

/// Options shared by every subcommand that reads a template.
#[derive(Debug, Args)]
pub struct Input {
    /// Template file, or `-` for stdin
    #[arg(value_name = "TEMPLATE")]
    pub template: PathBuf,

    /// Data file (`.json`, `.yaml` or `.yml`)
    #[arg(short, long, value_name = "FILE")]
    pub data: Option<PathBuf>,

    /// Directory of partials, searched recursively
    #[arg(short, long = "partials", value_name = "DIR")]
    pub partial_dirs: Vec<PathBuf>,

    /// A single partial as NAME=FILE
    #[arg(long = "partial", value_name = "NAME=FILE", value_parser = parse_partial)]
    pub partials: Vec<(String, PathBuf)>,

    /// Starting delimiters, e.g. "<% %>"
    #[arg(long, value_name = "OPEN CLOSE", value_parser = parse_delimiters)]
    pub delimiters: Option<mustang::Delimiters>,
}

fn parse_partial(arg: &str) -> Result<(String, PathBuf), String> {
    match arg.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => {
            Ok((name.to_string(), PathBuf::from(path)))
        }
        _ => Err(format!("expected NAME=FILE, got \"{arg}\"")),
    }
}

fn parse_delimiters(arg: &str) -> Result<mustang::Delimiters, String> {
    mustang::Delimiters::parse(arg)
        .ok_or_else(|| format!("expected two delimiters separated by a space, got \"{arg}\""))
}
