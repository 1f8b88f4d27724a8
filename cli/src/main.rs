#![deny(missing_docs)]

//! # ZRO CLI
//!
//! Command Line Interface for the ZRO OpenAPI document assembler.
//!
//! Supported Commands:
//! - `generate`: Config + Routes + Unit declarations -> OpenAPI JSON documents.
//! - `routes`: Prints the parsed route index.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::error::CliResult;

mod error;
mod generate;
mod routes_cmd;
mod units;

#[derive(Parser, Debug)]
#[clap(author, version, about = "ZRO OpenAPI document assembler")]
struct Cli {
    /// Log debug output (overridden by RUST_LOG).
    #[clap(long, short, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Assemble and write the configured OpenAPI documents.
    Generate(generate::GenerateArgs),
    /// Print the route index actions are bound against.
    Routes(routes_cmd::RoutesArgs),
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Generate(args) => generate::execute(args)?,
        Commands::Routes(args) => routes_cmd::execute(args)?,
    }

    Ok(())
}
