use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Library section exists (enforced by serde) and has a root
/// - Sync timeout is not 0
/// - Media center, when present, has both a URL and an API key
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.library.root.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "library.root cannot be empty".to_string(),
        ));
    }

    if config.sync.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "sync.timeout_secs cannot be 0".to_string(),
        ));
    }

    if let Some(media_center) = &config.media_center {
        if media_center.url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "media_center.url cannot be empty".to_string(),
            ));
        }
        if media_center.api_key.is_empty() {
            return Err(ConfigError::ValidationError(
                "media_center.api_key cannot be empty".to_string(),
            ));
        }
    }

    Ok(())
}
