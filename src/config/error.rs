use thiserror::Error;

#[derive(Error, Debug)]
pub(crate) enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] Box<figment::Error>),

    #[error("Missing required config file: {0}")]
    MissingConfig(String),

    #[error(transparent)]
    Chain(#[from] scout_chain::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
