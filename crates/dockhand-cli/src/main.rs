//! Dockhand CLI binary entrypoint.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use dockhand_cli::cli::Cli;
use dockhand_cli::output::OutputFormat;
use dockhand_cli::{CliError, commands};
use dockhand_fleet::{FleetConfig, FleetManager};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = FleetConfig::from_env();
    if let Some(socket) = cli.socket {
        config.socket_path = socket;
    }
    let manager = FleetManager::connect(config);

    let format = OutputFormat::new(cli.format);
    let mut stdout = io::stdout().lock();
    commands::dispatch(&manager, cli.command, &mut stdout, &format)
}
