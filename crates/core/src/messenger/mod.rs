//! Channel messaging.

mod telegram;
mod types;

pub use telegram::TelegramMessenger;
pub use types::{MessageHandle, Messenger, MessengerError, SendVideo};
