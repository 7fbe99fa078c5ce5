use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::downloader::DownloaderConfig;
use crate::orchestrator::OrchestratorConfig;
use crate::publisher::PublisherConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub apis: ApiConfig,
    #[serde(default)]
    pub downloader: DownloaderConfig,
    #[serde(default)]
    pub publisher: PublisherConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
}

/// Telegram delivery configuration.
///
/// The uploads channel receives the video files, the index channel
/// receives the summary post with links into the uploads channel.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelegramConfig {
    /// Bot token from @BotFather.
    pub bot_token: String,
    /// Channel where video files are uploaded (e.g. -1001234567890).
    pub uploads_channel_id: i64,
    /// Public username of the uploads channel (for t.me/... links).
    pub uploads_channel_username: String,
    /// Channel where episode summaries and links are posted.
    pub index_channel_id: i64,
    /// Public username of the index channel (shown in post footers).
    #[serde(default)]
    pub index_channel_username: String,
    /// Channel title shown on thumbnails and posts.
    #[serde(default = "default_channel_title")]
    pub channel_title: String,
    /// Optional comments group link for post footers.
    #[serde(default)]
    pub comments_group_link: String,
    /// Id of the pinned status message in the uploads channel,
    /// edited in place by the status refresh loop. 0 disables it.
    #[serde(default)]
    pub status_message_id: i64,
}

fn default_channel_title() -> String {
    "AnimeBot".to_string()
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: std::net::IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> std::net::IpAddr {
    std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("animebot.db")
}

/// External metadata/content API endpoints.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// AniList GraphQL endpoint.
    #[serde(default = "default_anilist_url")]
    pub anilist_url: String,
    /// Consumet API base URL (self-hosted or public instance).
    #[serde(default = "default_consumet_url")]
    pub consumet_url: String,
    /// Request timeout in seconds for both APIs.
    #[serde(default = "default_api_timeout")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            anilist_url: default_anilist_url(),
            consumet_url: default_consumet_url(),
            timeout_secs: default_api_timeout(),
        }
    }
}

fn default_anilist_url() -> String {
    "https://graphql.anilist.co".to_string()
}

fn default_consumet_url() -> String {
    "https://api.consumet.org".to_string()
}

fn default_api_timeout() -> u64 {
    30
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub telegram: SanitizedTelegramConfig,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub apis: ApiConfig,
    pub downloader: DownloaderConfig,
    pub publisher: PublisherConfig,
    pub orchestrator: OrchestratorConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedTelegramConfig {
    pub bot_token: String,
    pub uploads_channel_id: i64,
    pub uploads_channel_username: String,
    pub index_channel_id: i64,
    pub index_channel_username: String,
    pub channel_title: String,
    pub comments_group_link: String,
    pub status_message_id: i64,
}

impl Config {
    /// Produce a copy safe to expose over the API.
    pub fn sanitized(&self) -> SanitizedConfig {
        SanitizedConfig {
            telegram: SanitizedTelegramConfig {
                bot_token: "***".to_string(),
                uploads_channel_id: self.telegram.uploads_channel_id,
                uploads_channel_username: self.telegram.uploads_channel_username.clone(),
                index_channel_id: self.telegram.index_channel_id,
                index_channel_username: self.telegram.index_channel_username.clone(),
                channel_title: self.telegram.channel_title.clone(),
                comments_group_link: self.telegram.comments_group_link.clone(),
                status_message_id: self.telegram.status_message_id,
            },
            server: self.server.clone(),
            database: self.database.clone(),
            apis: self.apis.clone(),
            downloader: self.downloader.clone(),
            publisher: self.publisher.clone(),
            orchestrator: self.orchestrator.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_telegram() -> TelegramConfig {
        TelegramConfig {
            bot_token: "123:abc".to_string(),
            uploads_channel_id: -1001,
            uploads_channel_username: "uploads".to_string(),
            index_channel_id: -1002,
            index_channel_username: "index".to_string(),
            channel_title: default_channel_title(),
            comments_group_link: String::new(),
            status_message_id: 42,
        }
    }

    #[test]
    fn test_defaults() {
        let db = DatabaseConfig::default();
        assert_eq!(db.path, PathBuf::from("animebot.db"));

        let apis = ApiConfig::default();
        assert_eq!(apis.anilist_url, "https://graphql.anilist.co");
        assert_eq!(apis.timeout_secs, 30);
    }

    #[test]
    fn test_sanitized_redacts_token() {
        let config = Config {
            telegram: minimal_telegram(),
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            apis: ApiConfig::default(),
            downloader: DownloaderConfig::default(),
            publisher: PublisherConfig::default(),
            orchestrator: OrchestratorConfig::default(),
        };
        let sanitized = config.sanitized();
        assert_eq!(sanitized.telegram.bot_token, "***");
        assert_eq!(sanitized.telegram.uploads_channel_id, -1001);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("123:abc"));
    }
}
