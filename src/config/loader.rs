use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use super::{Config, ConfigRaw, defaults};
use crate::config::ConfigError;

/// Default config file, read from the working directory when present.
pub(crate) const DEFAULT_CONFIG_FILE: &str = "config.toml";
/// Prefix of environment overrides; nested keys are separated by `__`.
pub(crate) const ENV_PREFIX: &str = "SCOUT_";

/// Loads configuration with layered sources (priority: lowest to highest):
/// typed defaults, `config.toml`, the `--config` file, then `SCOUT_` environment variables.
pub(crate) fn load_configuration(custom_config_path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(defaults::config()));

    // User overrides from config.toml
    if Path::new(DEFAULT_CONFIG_FILE).exists() {
        figment = figment.merge(Toml::file(DEFAULT_CONFIG_FILE));
    }

    // An explicitly requested file must exist
    if let Some(config_path) = custom_config_path {
        if !config_path.exists() {
            return Err(ConfigError::MissingConfig(config_path.display().to_string()));
        }
        figment = figment.merge(Toml::file(config_path));
    }

    figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: ConfigRaw = figment.extract().map_err(Box::new)?;
    config.resolve()
}
