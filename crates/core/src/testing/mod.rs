//! Mock collaborators for tests.
//!
//! Each mock records its calls behind an `RwLock` and can be scripted
//! to return canned data or fail on demand.

mod messenger;
mod metadata;
mod resolver;
mod thumbnails;

pub use messenger::MockMessenger;
pub use metadata::MockMetadataClient;
pub use resolver::MockSourceResolver;
pub use thumbnails::MockThumbnailRenderer;
