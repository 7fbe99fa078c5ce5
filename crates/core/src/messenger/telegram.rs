//! Telegram Bot API messenger.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};
use serde::Deserialize;
use serde_json::json;
use tokio_util::io::ReaderStream;
use tracing::debug;

use super::types::{MessageHandle, Messenger, MessengerError, SendVideo};

const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Messenger backed by the Telegram Bot API.
pub struct TelegramMessenger {
    client: Client,
    base_url: String,
    token: String,
}

impl TelegramMessenger {
    pub fn new(token: &str) -> Result<Self, MessengerError> {
        Self::with_base_url(token, DEFAULT_API_URL)
    }

    /// Point the client at a different API host (used by tests).
    pub fn with_base_url(token: &str, base_url: &str) -> Result<Self, MessengerError> {
        // Uploads of multi-hundred-megabyte videos take a while; only
        // the connect phase gets a tight timeout.
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    async fn file_part(path: &Path) -> Result<Part, MessengerError> {
        let file = tokio::fs::File::open(path).await?;
        let length = file.metadata().await?.len();
        let stream = ReaderStream::new(file);
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());

        Ok(Part::stream_with_length(Body::wrap_stream(stream), length).file_name(filename))
    }

    async fn parse_response(response: reqwest::Response) -> Result<MessageHandle, MessengerError> {
        let envelope: ApiResponse = response.json().await?;

        if !envelope.ok {
            return Err(MessengerError::Api(
                envelope
                    .description
                    .unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        let message = envelope
            .result
            .ok_or_else(|| MessengerError::Api("response has no result".to_string()))?;

        Ok(MessageHandle {
            chat_id: message.chat.id,
            message_id: message.message_id,
        })
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_video(&self, request: SendVideo) -> Result<MessageHandle, MessengerError> {
        debug!(
            "sendVideo: chat={} file={}",
            request.chat_id,
            request.path.display()
        );

        let mut form = Form::new()
            .text("chat_id", request.chat_id.to_string())
            .text("caption", request.caption)
            .text("parse_mode", "HTML")
            .text("supports_streaming", "true")
            .part("video", Self::file_part(&request.path).await?);

        if let Some(thumbnail) = &request.thumbnail {
            form = form.part("thumbnail", Self::file_part(thumbnail).await?);
        }

        if let Some(markup) = request.reply_markup {
            form = form.text("reply_markup", markup.to_string());
        }

        let response = self
            .client
            .post(self.method_url("sendVideo"))
            .multipart(form)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    async fn send_text(&self, chat_id: i64, text: &str) -> Result<MessageHandle, MessengerError> {
        debug!("sendMessage: chat={}", chat_id);

        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&json!({
                "chat_id": chat_id,
                "text": text,
                "parse_mode": "HTML",
                "disable_web_page_preview": true,
            }))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    async fn edit_text(&self, handle: MessageHandle, text: &str) -> Result<(), MessengerError> {
        debug!(
            "editMessageText: chat={} message={}",
            handle.chat_id, handle.message_id
        );

        let response = self
            .client
            .post(self.method_url("editMessageText"))
            .json(&json!({
                "chat_id": handle.chat_id,
                "message_id": handle.message_id,
                "text": text,
                "parse_mode": "HTML",
                "disable_web_page_preview": true,
            }))
            .send()
            .await?;

        let envelope: ApiResponse = response.json().await?;
        if !envelope.ok {
            let description = envelope
                .description
                .unwrap_or_else(|| "unknown error".to_string());
            // Telegram rejects edits that would not change anything;
            // for a status message that is a no-op, not a failure.
            if description.contains("message is not modified") {
                return Ok(());
            }
            return Err(MessengerError::Api(description));
        }
        Ok(())
    }
}

// ============================================================================
// Telegram API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    result: Option<MessageResult>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageResult {
    message_id: i64,
    chat: ChatResult,
}

#[derive(Debug, Deserialize)]
struct ChatResult {
    id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_url() {
        let messenger = TelegramMessenger::with_base_url("123:abc", "http://localhost:9999/").unwrap();
        assert_eq!(
            messenger.method_url("sendVideo"),
            "http://localhost:9999/bot123:abc/sendVideo"
        );
    }

    #[test]
    fn test_parse_success_envelope() {
        let body = r#"{"ok": true, "result": {"message_id": 77, "chat": {"id": -1001}}}"#;
        let envelope: ApiResponse = serde_json::from_str(body).unwrap();
        assert!(envelope.ok);
        let message = envelope.result.unwrap();
        assert_eq!(message.message_id, 77);
        assert_eq!(message.chat.id, -1001);
    }

    #[test]
    fn test_parse_error_envelope() {
        let body = r#"{"ok": false, "description": "Bad Request: chat not found"}"#;
        let envelope: ApiResponse = serde_json::from_str(body).unwrap();
        assert!(!envelope.ok);
        assert_eq!(
            envelope.description.as_deref(),
            Some("Bad Request: chat not found")
        );
    }
}
