use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Load configuration from file with environment variable overrides.
///
/// Overrides use the `ANIMEBOT_` prefix with `__` between nesting
/// levels, so snake_case keys stay addressable:
/// `ANIMEBOT_TELEGRAM__BOT_TOKEN` maps to `telegram.bot_token`.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("ANIMEBOT_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"
[telegram]
bot_token = "123:abc"
uploads_channel_id = -1001
uploads_channel_username = "uploads"
index_channel_id = -1002
status_message_id = 42
"#;

    #[test]
    fn test_load_config_from_str_valid() {
        let config = load_config_from_str(MINIMAL).unwrap();
        assert_eq!(config.telegram.bot_token, "123:abc");
        assert_eq!(config.telegram.uploads_channel_id, -1001);
        // Defaults fill in everything else.
        assert_eq!(config.apis.anilist_url, "https://graphql.anilist.co");
        assert_eq!(config.downloader.max_retries, 3);
    }

    #[test]
    fn test_load_config_from_str_missing_telegram() {
        let toml = r#"
[database]
path = "test.db"
"#;
        let result = load_config_from_str(toml);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_env_override_reaches_snake_case_keys() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", MINIMAL).unwrap();

        std::env::set_var("ANIMEBOT_TELEGRAM__BOT_TOKEN", "999:zzz");
        let config = load_config(temp_file.path());
        std::env::remove_var("ANIMEBOT_TELEGRAM__BOT_TOKEN");

        assert_eq!(config.unwrap().telegram.bot_token, "999:zzz");
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", MINIMAL).unwrap();
        writeln!(
            temp_file,
            r#"
[downloader]
qualities = ["480p", "720p"]
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.telegram.status_message_id, 42);
        assert_eq!(config.downloader.qualities, vec!["480p", "720p"]);
    }
}
