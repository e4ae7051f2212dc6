use std::collections::HashSet;

use super::{types::Config, ConfigError, ProviderConfig};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Search timeouts are positive
/// - Provider IDs are non-empty and unique, including the catalog ID
/// - Jackett entries have a URL
/// - Media path keys are non-empty
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.search.provider_timeout_ms == 0 {
        return Err(ConfigError::ValidationError(
            "search.provider_timeout_ms must be greater than 0".to_string(),
        ));
    }
    if config.catalog.pool_size == 0 {
        return Err(ConfigError::ValidationError(
            "catalog.pool_size must be greater than 0".to_string(),
        ));
    }

    if config.media.paths.keys().any(|key| key.trim().is_empty()) {
        return Err(ConfigError::ValidationError(
            "media.paths keys cannot be empty".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    if config.catalog.enabled {
        if config.catalog.id.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "catalog.id cannot be empty".to_string(),
            ));
        }
        seen.insert(config.catalog.id.as_str());
    }

    for provider in &config.providers {
        let id = provider.id();
        if id.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "provider id cannot be empty".to_string(),
            ));
        }
        if !seen.insert(id) {
            return Err(ConfigError::ValidationError(format!(
                "duplicate provider id: {}",
                id
            )));
        }
        if provider.timeout_secs() == 0 {
            return Err(ConfigError::ValidationError(format!(
                "provider {}: timeout_secs must be greater than 0",
                id
            )));
        }
        if let ProviderConfig::Jackett(jackett) = provider {
            if jackett.url.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "provider {}: url cannot be empty",
                    id
                )));
            }
        }
    }

    Ok(())
}
