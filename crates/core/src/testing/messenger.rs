use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::messenger::{MessageHandle, Messenger, MessengerError, SendVideo};

/// Recording messenger. Successful sends get increasing message ids
/// starting at 100.
pub struct MockMessenger {
    videos: RwLock<Vec<SendVideo>>,
    texts: RwLock<Vec<(i64, String)>>,
    edits: RwLock<Vec<(MessageHandle, String)>>,
    next_video_error: RwLock<Option<String>>,
    next_text_error: RwLock<Option<String>>,
    next_message_id: AtomicI64,
}

impl Default for MockMessenger {
    fn default() -> Self {
        Self {
            videos: RwLock::new(Vec::new()),
            texts: RwLock::new(Vec::new()),
            edits: RwLock::new(Vec::new()),
            next_video_error: RwLock::new(None),
            next_text_error: RwLock::new(None),
            next_message_id: AtomicI64::new(100),
        }
    }
}

impl MockMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `send_video` call with an API error.
    pub fn fail_next_video(&self, description: &str) {
        *self.next_video_error.write().unwrap() = Some(description.to_string());
    }

    /// Fail the next `send_text` call with an API error.
    pub fn fail_next_text(&self, description: &str) {
        *self.next_text_error.write().unwrap() = Some(description.to_string());
    }

    pub fn sent_videos(&self) -> Vec<SendVideo> {
        self.videos.read().unwrap().clone()
    }

    pub fn sent_texts(&self) -> Vec<(i64, String)> {
        self.texts.read().unwrap().clone()
    }

    pub fn edits(&self) -> Vec<(MessageHandle, String)> {
        self.edits.read().unwrap().clone()
    }
}

#[async_trait]
impl Messenger for MockMessenger {
    async fn send_video(&self, request: SendVideo) -> Result<MessageHandle, MessengerError> {
        if let Some(description) = self.next_video_error.write().unwrap().take() {
            return Err(MessengerError::Api(description));
        }
        let chat_id = request.chat_id;
        self.videos.write().unwrap().push(request);
        Ok(MessageHandle {
            chat_id,
            message_id: self.next_message_id.fetch_add(1, Ordering::SeqCst),
        })
    }

    async fn send_text(&self, chat_id: i64, text: &str) -> Result<MessageHandle, MessengerError> {
        if let Some(description) = self.next_text_error.write().unwrap().take() {
            return Err(MessengerError::Api(description));
        }
        self.texts.write().unwrap().push((chat_id, text.to_string()));
        Ok(MessageHandle {
            chat_id,
            message_id: self.next_message_id.fetch_add(1, Ordering::SeqCst),
        })
    }

    async fn edit_text(&self, handle: MessageHandle, text: &str) -> Result<(), MessengerError> {
        self.edits.write().unwrap().push((handle, text.to_string()));
        Ok(())
    }
}
