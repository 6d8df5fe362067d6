use std::collections::HashSet;

use super::{types::Config, ConfigError};
use crate::license::License;

/// Validate configuration
/// Currently validates:
/// - Provider endpoints are non-empty
/// - License order only names known tiers, without repeats
/// - Batch sizes and the fetch cap are non-zero
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let provider = &config.provider;
    for (name, value) in [
        ("provider.rest_endpoint", &provider.rest_endpoint),
        ("provider.static_base_url", &provider.static_base_url),
        ("provider.profile_base_url", &provider.profile_base_url),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "{} cannot be empty",
                name
            )));
        }
    }

    let discovery = &config.discovery;
    if discovery.license_order.is_empty() {
        return Err(ConfigError::ValidationError(
            "discovery.license_order cannot be empty".to_string(),
        ));
    }
    let mut seen = HashSet::new();
    for id in &discovery.license_order {
        License::try_from(*id).map_err(|e| {
            ConfigError::ValidationError(format!("discovery.license_order: {}", e))
        })?;
        if !seen.insert(*id) {
            return Err(ConfigError::ValidationError(format!(
                "discovery.license_order lists license {} twice",
                id
            )));
        }
    }
    if discovery.small_batch_size == 0 || discovery.large_batch_size == 0 {
        return Err(ConfigError::ValidationError(
            "discovery batch sizes cannot be 0".to_string(),
        ));
    }

    if config.acquisition.max_parallel_fetches == 0 {
        return Err(ConfigError::ValidationError(
            "acquisition.max_parallel_fetches cannot be 0".to_string(),
        ));
    }

    Ok(())
}
