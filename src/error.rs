use thiserror::Error;

use crate::config::ConfigError;

/// Top-level application error that composes all subsystem errors
#[derive(Error, Debug)]
pub(crate) enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Resolver(#[from] scout_resolver::ResolverError),

    #[error("Failed to encode output: {0}")]
    Output(#[from] serde_json::Error),
}
