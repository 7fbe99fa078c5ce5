use super::{types::Config, ConfigError};

/// Validate configuration at startup.
///
/// Missing required settings are fatal: the process must refuse to
/// serve rather than run half-configured.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    if config.telegram.bot_token.is_empty() {
        errors.push("telegram.bot_token is not set");
    }
    if config.telegram.uploads_channel_id == 0 {
        errors.push("telegram.uploads_channel_id is not set");
    }
    if config.telegram.uploads_channel_username.is_empty() {
        errors.push("telegram.uploads_channel_username is not set");
    }
    if config.telegram.index_channel_id == 0 {
        errors.push("telegram.index_channel_id is not set");
    }
    if config.downloader.qualities.is_empty() {
        errors.push("downloader.qualities cannot be empty");
    }
    if config.downloader.max_retries == 0 {
        errors.push("downloader.max_retries must be at least 1");
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;

    fn valid_config() -> Config {
        load_config_from_str(
            r#"
[telegram]
bot_token = "123:abc"
uploads_channel_id = -1001
uploads_channel_username = "uploads"
index_channel_id = -1002
status_message_id = 42
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_validate_missing_token_fails() {
        let mut config = valid_config();
        config.telegram.bot_token = String::new();
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
        assert!(err.to_string().contains("bot_token"));
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let mut config = valid_config();
        config.telegram.bot_token = String::new();
        config.telegram.uploads_channel_id = 0;
        config.downloader.qualities.clear();
        let err = validate_config(&config).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("bot_token"));
        assert!(msg.contains("uploads_channel_id"));
        assert!(msg.contains("qualities"));
    }

    #[test]
    fn test_validate_zero_retries_fails() {
        let mut config = valid_config();
        config.downloader.max_retries = 0;
        assert!(validate_config(&config).is_err());
    }
}
