//! Configuration validation.
//!
//! Validation runs after loading, before the runtime starts: a bad value
//! should stop startup with a clear message rather than surface as an odd
//! failure mid-dispatch.

use super::error::{ConfigError, ConfigResult};
use super::schema::{LogOutput, RelayConfig};

/// Validates a loaded configuration.
pub fn validate_config(config: &RelayConfig) -> ConfigResult<()> {
    if config.server.port == 0 {
        return Err(ConfigError::InvalidPort(config.server.port));
    }

    if let Some(prefix) = &config.server.path_prefix {
        if !prefix.starts_with('/') {
            return Err(ConfigError::validation(format!(
                "server.path_prefix must start with '/', got '{prefix}'"
            )));
        }
        if prefix.ends_with('/') {
            return Err(ConfigError::validation(format!(
                "server.path_prefix must not end with '/', got '{prefix}'"
            )));
        }
    }

    if config.logging.output == LogOutput::File && config.logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&RelayConfig::default()).is_ok());
    }

    #[test]
    fn zero_port_is_rejected() {
        let mut config = RelayConfig::default();
        config.server.port = 0;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::InvalidPort(0))
        ));
    }

    #[test]
    fn path_prefix_shape_is_enforced() {
        let mut config = RelayConfig::default();
        config.server.path_prefix = Some("index.php".to_string());
        assert!(validate_config(&config).is_err());

        config.server.path_prefix = Some("/index.php/".to_string());
        assert!(validate_config(&config).is_err());

        config.server.path_prefix = Some("/index.php".to_string());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn file_output_requires_path() {
        let mut config = RelayConfig::default();
        config.logging.output = LogOutput::File;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingField { .. })
        ));
    }
}
