//! fetchkit CLI
//!
//! Main entry point for the `fetchkit` binary.

use std::process::ExitCode;

use clap::Parser;
use fetchkit_cli::{cli::Cli, commands, config, CliError};
use fetchkit_log::{LogConfig, LogLevel};
use tracing::error;

fn main() -> ExitCode {
    config::load_env_files();

    // Parse CLI arguments
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli) {
        eprintln!("error: {e}");
        return e.exit_code();
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            let e = CliError::io("failed to create Tokio runtime", e);
            error!("{e}");
            return e.exit_code();
        }
    };

    match runtime.block_on(commands::execute(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            e.exit_code()
        }
    }
}

/// Environment configures logging; `-v`/`-q` override the level.
fn init_logging(cli: &Cli) -> Result<(), CliError> {
    let mut config = LogConfig::from_env();
    if cli.verbose > 0 || cli.quiet {
        config = config.with_level(LogLevel::from_verbosity(cli.verbose, cli.quiet));
    }
    fetchkit_log::init(config).map_err(|e| CliError::config("failed to initialize logging", e))
}
