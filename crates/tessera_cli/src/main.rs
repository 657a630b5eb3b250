//! TESSERA CLI
//!
//! Resolves model declarations, copies resolved graphs and prints them.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod commands;

use clap::{Args, Parser, Subcommand};
use color_eyre::Result;
use commands::ResolveOptions;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tessera")]
#[command(about = "TESSERA - Dynamic type model construction", long_about = None)]
struct Cli {
    /// Log construction details
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ResolveArgs {
    /// Path to the JSON declaration
    #[arg(short, long)]
    file: PathBuf,
    /// Run every phase even after errors
    #[arg(long)]
    no_abort: bool,
    /// Skip role and singleton creation
    #[arg(long)]
    no_singletons: bool,
    /// Groups known to role assignments
    #[arg(long = "group")]
    groups: Vec<String>,
}

impl ResolveArgs {
    fn options(&self) -> ResolveOptions {
        ResolveOptions {
            abort_on_errors: !self.no_abort,
            singletons: !self.no_singletons,
            groups: self.groups.clone(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a declaration and report all diagnostics
    Check {
        #[command(flatten)]
        resolve: ResolveArgs,
    },
    /// Resolve a declaration and copy the selected modules
    Copy {
        #[command(flatten)]
        resolve: ResolveArgs,
        /// Modules to copy, all if unset
        #[arg(long, value_delimiter = ',')]
        modules: Vec<String>,
    },
    /// Resolve a declaration and print the graph as JSON
    Dump {
        #[command(flatten)]
        resolve: ResolveArgs,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn init_logging(verbose: bool, json: bool) {
    let filter = if verbose {
        EnvFilter::new("tessera=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tessera=info"))
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.json_logs);

    match cli.command {
        Commands::Check { resolve } => {
            println!("{}", commands::check(&resolve.file, &resolve.options())?);
            Ok(())
        }
        Commands::Copy { resolve, modules } => {
            println!("{}", commands::copy(&resolve.file, &resolve.options(), &modules)?);
            Ok(())
        }
        Commands::Dump { resolve, output } => {
            let json = commands::dump(&resolve.file, &resolve.options())?;
            match output {
                Some(path) => commands::write_output(&path, &json),
                None => {
                    println!("{}", json);
                    Ok(())
                }
            }
        }
    }
}
