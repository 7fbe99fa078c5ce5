//! Publishing of downloaded episodes to the channels.

mod config;
mod publish;
mod thumbnail;
mod types;

pub use config::PublisherConfig;
pub use publish::{hashtag, message_link, Publisher};
pub use thumbnail::CoverArtRenderer;
pub use types::{PublishOutcome, ThumbnailError, ThumbnailRenderer};
