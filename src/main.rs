mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    for (key, value) in cli.command.table_format().env_vars() {
        // SAFETY: no other thread exists yet; polars starts its pool lazily.
        unsafe { std::env::set_var(key, value) };
    }
    init_logging(cli.verbose);

    match cli.command {
        Commands::Metadata(args) => cli::metadata_command(args),
        Commands::Inspect(args) => cli::inspect_command(args),
        Commands::Extracts(args) => cli::extracts_command(args),
        Commands::Filter(args) => cli::filter_command(args),
    }
}
