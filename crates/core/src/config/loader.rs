use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Load configuration from file with environment variable overrides.
///
/// Environment variables use the `PHOTOHARVEST_` prefix and `__` as the
/// section separator, e.g. `PHOTOHARVEST_PROVIDER__API_KEY`.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    figment_with_env(Figment::new().merge(Toml::file(path)))
}

/// Load configuration from defaults plus environment, without a file.
pub fn load_config_from_env() -> Result<Config, ConfigError> {
    figment_with_env(Figment::new())
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

fn figment_with_env(figment: Figment) -> Result<Config, ConfigError> {
    Figment::from(Serialized::defaults(Config::default()))
        .merge(figment)
        .merge(Env::prefixed("PHOTOHARVEST_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}
