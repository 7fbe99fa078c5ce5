//! Types for channel messaging.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MessengerError {
    #[error("API error: {0}")]
    Api(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reference to a message that was sent, enough to link to it or edit
/// it later.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageHandle {
    pub chat_id: i64,
    pub message_id: i64,
}

/// A video upload request.
#[derive(Debug, Clone)]
pub struct SendVideo {
    pub chat_id: i64,
    pub path: PathBuf,
    /// HTML-formatted caption.
    pub caption: String,
    /// Optional thumbnail image on disk.
    pub thumbnail: Option<PathBuf>,
    /// Inline keyboard in the platform's JSON format.
    pub reply_markup: Option<serde_json::Value>,
}

/// Channel messaging surface: video uploads, text posts and edits.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_video(&self, request: SendVideo) -> Result<MessageHandle, MessengerError>;

    /// Post an HTML-formatted text message.
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<MessageHandle, MessengerError>;

    /// Replace the text of an existing message.
    async fn edit_text(&self, handle: MessageHandle, text: &str) -> Result<(), MessengerError>;
}
