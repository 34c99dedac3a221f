mod cli;
mod commands;
mod config;
mod error;
mod logger;

use std::process::ExitCode;

/// Exit status when a search finished without finding anything.
const EXIT_NOT_FOUND: u8 = 1;
/// Exit status for configuration, input and provider errors.
const EXIT_FAILURE: u8 = 2;

pub async fn run() -> ExitCode {
    let cli = cli::parse();

    // The logger is configured from the file, so load failures can only go to stderr directly.
    let config = match config::load_configuration(cli.config.as_deref()) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("{error}");
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    logger::initialize(&config.logger, &config.telemetry);
    tracing::debug!(chains = config.chains.len(), "Configuration loaded successfully");

    match commands::execute(cli.command, &config).await {
        Ok(output) => {
            println!("{}", output.body);
            if output.found {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(EXIT_NOT_FOUND)
            }
        }
        Err(error) => {
            tracing::error!(error = %error, "Command failed");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}
