#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

mod commands;
mod logging;

use clap::Parser;
use commands::SourceArgs;
use miette::Result;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "waypath")]
#[command(author, version, about = "Resolve module specifiers the way a bundler would", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit JSON formatted output (stable, machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Override the working directory
    #[arg(long, global = true, value_name = "PATH")]
    cwd: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Resolve a specifier to a file or directory
    Resolve {
        #[command(flatten)]
        source: SourceArgs,

        /// Use blocking filesystem calls and resolve synchronously
        #[arg(long)]
        sync: bool,

        /// Include the diagnostic log in the output
        #[arg(long)]
        log: bool,
    },

    /// Resolve a specifier and print every stage the request went through
    Explain {
        #[command(flatten)]
        source: SourceArgs,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let cwd = cli
        .cwd
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    logging::init(cli.verbose, cli.json);

    match &cli.command {
        Commands::Resolve { source, sync, log } => {
            commands::resolve::run(&cwd, source, *sync, *log, cli.json)
        }
        Commands::Explain { source } => commands::explain::run(&cwd, source, cli.json),
    }
}
