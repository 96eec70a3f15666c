mod cli;
mod commands;
mod model;
mod storage;
mod util;

use anyhow::Result;
use clap::Parser;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::storage::NotFound;

fn main() {
    init_tracing();

    if let Err(err) = run() {
        if let Some(missing) = err.downcast_ref::<NotFound>() {
            warn!(reason = %missing, "not found");
            std::process::exit(2);
        }

        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ingest(args) => commands::ingest::run(args),
        Commands::Section(args) => commands::section::run(args),
        Commands::List(args) => commands::list::run(args),
        Commands::Cleanup(args) => commands::cleanup::run(args),
        Commands::Status(args) => commands::status::run(args),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
