//! Episode media download.

mod config;
mod fetch;

pub use config::DownloaderConfig;
pub use fetch::{sanitize_title, DownloadError, DownloadedFile, Downloader};
