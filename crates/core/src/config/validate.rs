use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Service base URL parses and has an http(s) scheme
/// - Poll interval and page sizes are non-zero
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Service validation
    match reqwest::Url::parse(&config.service.base_url) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => {
            return Err(ConfigError::ValidationError(format!(
                "service.base_url must be http or https, got {}",
                url.scheme()
            )));
        }
        Err(e) => {
            return Err(ConfigError::ValidationError(format!(
                "service.base_url is not a valid URL: {e}"
            )));
        }
    }
    if config.service.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "service.timeout_secs cannot be 0".to_string(),
        ));
    }

    // Coordinator validation
    if config.coordinator.poll_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "coordinator.poll_interval_ms cannot be 0".to_string(),
        ));
    }
    if config.coordinator.recovery_page_size == 0 {
        return Err(ConfigError::ValidationError(
            "coordinator.recovery_page_size cannot be 0".to_string(),
        ));
    }

    // Directory validation
    for (name, size) in [
        ("directory.ticket_page_size", config.directory.ticket_page_size),
        (
            "directory.analyzed_page_size",
            config.directory.analyzed_page_size,
        ),
        ("directory.run_page_size", config.directory.run_page_size),
    ] {
        if size == 0 {
            return Err(ConfigError::ValidationError(format!("{name} cannot be 0")));
        }
    }

    Ok(())
}
