//! Resolution of episodes to downloadable media URLs.

mod consumet;
mod types;

pub use consumet::ConsumetClient;
pub use types::{EpisodeDescriptor, ResolverError, SourceResolver};
