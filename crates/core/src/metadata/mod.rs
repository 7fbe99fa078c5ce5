//! Series metadata lookups against an upstream catalog.

mod anilist;
mod types;

pub use anilist::AniListClient;
pub use types::{MetadataClient, MetadataError, SeriesInfo, SeriesSearchResult};
