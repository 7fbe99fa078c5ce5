//! Episode publishing: uploads, captions, links and the summary post.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use super::types::{PublishOutcome, ThumbnailRenderer};
use super::PublisherConfig;
use crate::catalog::{CatalogStore, EpisodeStatus};
use crate::config::TelegramConfig;
use crate::downloader::{sanitize_title, DownloadedFile};
use crate::messenger::{Messenger, SendVideo};
use crate::queue::QueueJob;
use crate::stats::{StatsStore, COUNTER_UPLOADS};

/// Publishes downloaded episode files to the uploads channel and
/// posts a summary with links to the index channel.
///
/// Publishing never fails as a whole: each variant is attempted
/// independently and the outcome reports what got through. The caller
/// decides the job's terminal status from `uploaded`.
pub struct Publisher {
    messenger: Arc<dyn Messenger>,
    thumbnails: Option<Arc<dyn ThumbnailRenderer>>,
    catalog: Arc<dyn CatalogStore>,
    stats: Arc<dyn StatsStore>,
    telegram: TelegramConfig,
    config: PublisherConfig,
}

impl Publisher {
    pub fn new(
        messenger: Arc<dyn Messenger>,
        thumbnails: Option<Arc<dyn ThumbnailRenderer>>,
        catalog: Arc<dyn CatalogStore>,
        stats: Arc<dyn StatsStore>,
        telegram: TelegramConfig,
        config: PublisherConfig,
    ) -> Self {
        Self {
            messenger,
            thumbnails,
            catalog,
            stats,
            telegram,
            config,
        }
    }

    /// Upload each downloaded variant, then post the episode summary.
    pub async fn publish(&self, job: &QueueJob, files: &[DownloadedFile]) -> PublishOutcome {
        let mut outcome = PublishOutcome::default();
        if files.is_empty() {
            return outcome;
        }

        let thumbnail = self.prepare_thumbnail(job).await;

        for (i, file) in files.iter().enumerate() {
            if i > 0 && self.config.upload_sleep_secs > 0 {
                tokio::time::sleep(Duration::from_secs(self.config.upload_sleep_secs)).await;
            }

            let caption = build_caption(
                &job.series_title,
                job.episode_number,
                &file.quality,
                file.size_bytes,
                &self.telegram.index_channel_username,
            );

            let request = SendVideo {
                chat_id: self.telegram.uploads_channel_id,
                path: file.path.clone(),
                caption,
                thumbnail: thumbnail.clone(),
                reply_markup: self
                    .config
                    .enable_voting
                    .then(|| vote_keyboard(job.series_id, job.episode_number)),
            };

            match self.messenger.send_video(request).await {
                Ok(handle) => {
                    info!(
                        "'{}' E{:03} {}: uploaded as message {}",
                        job.series_title, job.episode_number, file.quality, handle.message_id
                    );
                    outcome.links.push((
                        file.quality.clone(),
                        message_link(&self.telegram.uploads_channel_username, handle.message_id),
                    ));
                    outcome.uploaded += 1;

                    if let Err(e) = self.stats.increment(COUNTER_UPLOADS, 1) {
                        warn!("Could not bump upload counter: {}", e);
                    }
                    if self.config.delete_after_upload {
                        if let Err(e) = tokio::fs::remove_file(&file.path).await {
                            warn!("Could not remove {}: {}", file.path.display(), e);
                        }
                    }
                }
                Err(e) => {
                    warn!(
                        "'{}' E{:03} {}: upload failed: {}",
                        job.series_title, job.episode_number, file.quality, e
                    );
                    outcome.failed += 1;
                }
            }
        }

        if let Some(path) = &thumbnail {
            if let Err(e) = tokio::fs::remove_file(path).await {
                warn!("Could not remove thumbnail {}: {}", path.display(), e);
            }
        }

        if outcome.uploaded > 0 {
            self.post_summary(job, &outcome).await;

            if let Err(e) = self.catalog.set_episode_status(
                job.series_id,
                job.episode_number,
                EpisodeStatus::Published,
            ) {
                warn!(
                    "Could not mark episode {}/{} published: {}",
                    job.series_id, job.episode_number, e
                );
            }
        }

        outcome
    }

    /// Render the transient thumbnail for this episode. It lives only
    /// for the duration of the uploads; `publish` removes it. Any
    /// failure downgrades to an upload without a thumbnail.
    async fn prepare_thumbnail(&self, job: &QueueJob) -> Option<std::path::PathBuf> {
        if !self.config.enable_thumbnails {
            return None;
        }
        let renderer = self.thumbnails.as_ref()?;

        let path = self.config.thumbnail_dir.join(format!(
            "thumb_{}_E{:03}.jpg",
            sanitize_title(&job.series_title),
            job.episode_number
        ));

        let cover = match self.catalog.get_series(job.series_id) {
            Ok(Some(series)) if !series.cover_image.is_empty() => series.cover_image,
            _ => return None,
        };

        let bytes = match renderer
            .render(&job.series_title, job.episode_number, &cover)
            .await
        {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("'{}': {}", job.series_title, e);
                return None;
            }
        };

        if let Err(e) = tokio::fs::create_dir_all(&self.config.thumbnail_dir).await {
            warn!("Could not create thumbnail directory: {}", e);
            return None;
        }
        if let Err(e) = tokio::fs::write(&path, bytes).await {
            warn!("Could not write thumbnail {}: {}", path.display(), e);
            return None;
        }
        Some(path)
    }

    async fn post_summary(&self, job: &QueueJob, outcome: &PublishOutcome) {
        let text = build_summary(
            &job.series_title,
            job.episode_number,
            &outcome.links,
            &self.telegram.comments_group_link,
        );
        if let Err(e) = self
            .messenger
            .send_text(self.telegram.index_channel_id, &text)
            .await
        {
            warn!(
                "'{}' E{:03}: summary post failed: {}",
                job.series_title, job.episode_number, e
            );
        }
    }
}

/// t.me deep link to a message in a public channel.
pub fn message_link(channel_username: &str, message_id: i64) -> String {
    format!(
        "https://t.me/{}/{}",
        channel_username.trim_start_matches('@'),
        message_id
    )
}

/// Channel hashtag derived from the series title.
pub fn hashtag(series_title: &str) -> String {
    format!("#{}", sanitize_title(series_title))
}

fn human_size(bytes: u64) -> String {
    const MB: f64 = 1024.0 * 1024.0;
    let mb = bytes as f64 / MB;
    if mb >= 1024.0 {
        format!("{:.2} GB", mb / 1024.0)
    } else {
        format!("{:.1} MB", mb)
    }
}

fn build_caption(
    series_title: &str,
    episode: u32,
    quality: &str,
    size_bytes: u64,
    index_channel_username: &str,
) -> String {
    let mut caption = format!(
        "<b>{}</b>\nEpisode {:03} \u{2022} {} \u{2022} {}\n\n{}",
        series_title,
        episode,
        quality,
        human_size(size_bytes),
        hashtag(series_title),
    );
    if !index_channel_username.is_empty() {
        caption.push_str(&format!(
            "\n@{}",
            index_channel_username.trim_start_matches('@')
        ));
    }
    caption
}

fn vote_keyboard(series_id: i64, episode: u32) -> serde_json::Value {
    serde_json::json!({
        "inline_keyboard": [[
            {"text": "\u{1F44D}", "callback_data": format!("vote:up:{}:{}", series_id, episode)},
            {"text": "\u{1F44E}", "callback_data": format!("vote:down:{}:{}", series_id, episode)}
        ]]
    })
}

fn build_summary(
    series_title: &str,
    episode: u32,
    links: &[(String, String)],
    comments_group_link: &str,
) -> String {
    let mut text = format!(
        "\u{1F3AC} <b>{}</b> \u{2014} Episode {:03}\n\n",
        series_title, episode
    );
    for (quality, link) in links {
        text.push_str(&format!("{}: <a href=\"{}\">Watch</a>\n", quality, link));
    }
    if !comments_group_link.is_empty() {
        text.push_str(&format!(
            "\n\u{1F4AC} <a href=\"{}\">Comments</a>",
            comments_group_link
        ));
    }
    text
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::Utc;

    use super::*;
    use crate::catalog::{AddSeriesRequest, SeriesStatus, SqliteCatalog};
    use crate::queue::JobStatus;
    use crate::stats::SqliteStats;
    use crate::testing::{MockMessenger, MockThumbnailRenderer};

    fn telegram_config() -> TelegramConfig {
        TelegramConfig {
            bot_token: "123:abc".to_string(),
            uploads_channel_id: -1001,
            uploads_channel_username: "uploads".to_string(),
            index_channel_id: -1002,
            index_channel_username: "index".to_string(),
            channel_title: "AnimeBot".to_string(),
            comments_group_link: "https://t.me/+comments".to_string(),
            status_message_id: 0,
        }
    }

    fn test_job() -> QueueJob {
        QueueJob {
            id: "job-1".to_string(),
            series_id: 42,
            series_title: "Example Show".to_string(),
            episode_number: 6,
            sources: HashMap::new(),
            status: JobStatus::Uploading,
            priority: 0,
            enqueued_at: Utc::now(),
            started_at: Some(Utc::now()),
            completed_at: None,
            retries: 0,
            error_message: None,
        }
    }

    struct Fixture {
        messenger: Arc<MockMessenger>,
        thumbnails: Arc<MockThumbnailRenderer>,
        catalog: Arc<SqliteCatalog>,
        stats: Arc<SqliteStats>,
        publisher: Publisher,
        _tmp: tempfile::TempDir,
    }

    fn setup(config: PublisherConfig) -> Fixture {
        let tmp = tempfile::tempdir().unwrap();
        let messenger = Arc::new(MockMessenger::new());
        let thumbnails = Arc::new(MockThumbnailRenderer::new());
        let catalog = Arc::new(SqliteCatalog::in_memory().unwrap());
        let stats = Arc::new(SqliteStats::in_memory().unwrap());

        catalog
            .add_series(AddSeriesRequest {
                series_id: 42,
                title: "Example Show".to_string(),
                total_episodes: Some(12),
                status: SeriesStatus::Ongoing,
                cover_image: "http://img/cover.png".to_string(),
            })
            .unwrap();
        catalog
            .insert_episode(&crate::catalog::EpisodeRecord {
                series_id: 42,
                episode_number: 6,
                title: "Episode 6".to_string(),
                sources: HashMap::new(),
                status: EpisodeStatus::Downloaded,
                retries: 0,
                added_at: Utc::now(),
            })
            .unwrap();

        let config = PublisherConfig {
            thumbnail_dir: tmp.path().join("thumbs"),
            upload_sleep_secs: 0,
            ..config
        };

        let publisher = Publisher::new(
            messenger.clone(),
            Some(thumbnails.clone()),
            catalog.clone(),
            stats.clone(),
            telegram_config(),
            config,
        );

        Fixture {
            messenger,
            thumbnails,
            catalog,
            stats,
            publisher,
            _tmp: tmp,
        }
    }

    async fn downloaded_file(dir: &std::path::Path, quality: &str) -> DownloadedFile {
        let path = dir.join(format!("Example_Show_E006_{quality}.mp4"));
        tokio::fs::write(&path, b"video bytes").await.unwrap();
        DownloadedFile {
            quality: quality.to_string(),
            path,
            size_bytes: 11,
        }
    }

    #[test]
    fn test_message_link() {
        assert_eq!(message_link("uploads", 77), "https://t.me/uploads/77");
        assert_eq!(message_link("@uploads", 77), "https://t.me/uploads/77");
    }

    #[test]
    fn test_hashtag() {
        assert_eq!(hashtag("Example Show"), "#Example_Show");
    }

    #[test]
    fn test_human_size() {
        assert_eq!(human_size(50 * 1024 * 1024), "50.0 MB");
        assert_eq!(human_size(2 * 1024 * 1024 * 1024), "2.00 GB");
    }

    #[test]
    fn test_caption_contents() {
        let caption = build_caption("Example Show", 6, "720p", 50 * 1024 * 1024, "index");
        assert!(caption.contains("<b>Example Show</b>"));
        assert!(caption.contains("Episode 006"));
        assert!(caption.contains("720p"));
        assert!(caption.contains("50.0 MB"));
        assert!(caption.contains("#Example_Show"));
        assert!(caption.contains("@index"));
    }

    #[test]
    fn test_summary_contents() {
        let links = vec![
            ("480p".to_string(), "https://t.me/uploads/10".to_string()),
            ("720p".to_string(), "https://t.me/uploads/11".to_string()),
        ];
        let text = build_summary("Example Show", 6, &links, "https://t.me/+comments");
        assert!(text.contains("Episode 006"));
        assert!(text.contains("https://t.me/uploads/10"));
        assert!(text.contains("https://t.me/uploads/11"));
        assert!(text.contains("Comments"));
    }

    #[tokio::test]
    async fn test_publish_uploads_all_variants_and_posts_summary() {
        let fixture = setup(PublisherConfig::default());
        let dir = fixture._tmp.path().to_path_buf();
        let files = vec![
            downloaded_file(&dir, "480p").await,
            downloaded_file(&dir, "720p").await,
        ];

        let outcome = fixture.publisher.publish(&test_job(), &files).await;
        assert_eq!(outcome.uploaded, 2);
        assert_eq!(outcome.failed, 0);
        assert_eq!(outcome.links.len(), 2);

        let videos = fixture.messenger.sent_videos();
        assert_eq!(videos.len(), 2);
        assert_eq!(videos[0].chat_id, -1001);
        assert!(videos[0].reply_markup.is_some());

        // Exactly one summary, pointing at every uploaded variant.
        let texts = fixture.messenger.sent_texts();
        assert_eq!(texts.len(), 1);
        assert_eq!(texts[0].0, -1002);
        assert!(texts[0].1.contains("480p"));
        assert!(texts[0].1.contains("720p"));

        // Local files are gone, counters bumped, episode marked.
        for file in &files {
            assert!(tokio::fs::metadata(&file.path).await.is_err());
        }
        assert_eq!(fixture.stats.get().unwrap().total_uploads, 2);

        let episode = fixture.catalog.get_episode(42, 6).unwrap().unwrap();
        assert_eq!(episode.status, EpisodeStatus::Published);
    }

    #[tokio::test]
    async fn test_publish_isolates_variant_failures() {
        let fixture = setup(PublisherConfig::default());
        let dir = fixture._tmp.path().to_path_buf();
        let files = vec![
            downloaded_file(&dir, "480p").await,
            downloaded_file(&dir, "720p").await,
        ];

        fixture
            .messenger
            .fail_next_video("Request Entity Too Large");

        let outcome = fixture.publisher.publish(&test_job(), &files).await;
        assert_eq!(outcome.uploaded, 1);
        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.links.len(), 1);
        assert_eq!(outcome.links[0].0, "720p");

        // Summary still goes out for the variant that made it.
        assert_eq!(fixture.messenger.sent_texts().len(), 1);
        // The failed variant's file stays on disk.
        assert!(tokio::fs::metadata(&files[0].path).await.is_ok());
    }

    #[tokio::test]
    async fn test_publish_nothing_to_upload() {
        let fixture = setup(PublisherConfig::default());
        let outcome = fixture.publisher.publish(&test_job(), &[]).await;
        assert_eq!(outcome, PublishOutcome::default());
        assert!(fixture.messenger.sent_videos().is_empty());
        assert!(fixture.messenger.sent_texts().is_empty());
    }

    #[tokio::test]
    async fn test_voting_disabled_omits_keyboard() {
        let fixture = setup(PublisherConfig {
            enable_voting: false,
            ..PublisherConfig::default()
        });
        let dir = fixture._tmp.path().to_path_buf();
        let files = vec![downloaded_file(&dir, "720p").await];

        fixture.publisher.publish(&test_job(), &files).await;
        let videos = fixture.messenger.sent_videos();
        assert!(videos[0].reply_markup.is_none());
    }

    #[tokio::test]
    async fn test_thumbnail_rendered_per_episode_and_removed() {
        let fixture = setup(PublisherConfig::default());
        let dir = fixture._tmp.path().to_path_buf();

        let files = vec![downloaded_file(&dir, "720p").await];
        fixture.publisher.publish(&test_job(), &files).await;

        let videos = fixture.messenger.sent_videos();
        let thumb = videos[0].thumbnail.clone().unwrap();
        assert!(thumb
            .file_name()
            .unwrap()
            .to_str()
            .unwrap()
            .contains("E006"));

        // The renderer got the episode number and the cover, and the
        // asset is gone once the uploads are done.
        assert_eq!(
            fixture.thumbnails.calls(),
            vec![(
                "Example Show".to_string(),
                6,
                "http://img/cover.png".to_string()
            )]
        );
        assert!(tokio::fs::metadata(&thumb).await.is_err());

        // A later publish renders afresh rather than reusing a cache.
        let files = vec![downloaded_file(&dir, "480p").await];
        fixture.publisher.publish(&test_job(), &files).await;
        assert_eq!(fixture.thumbnails.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_render_failure_downgrades_to_plain_upload() {
        let fixture = setup(PublisherConfig::default());
        let dir = fixture._tmp.path().to_path_buf();
        let files = vec![downloaded_file(&dir, "720p").await];

        fixture.thumbnails.fail_renders();

        let outcome = fixture.publisher.publish(&test_job(), &files).await;
        assert_eq!(outcome.uploaded, 1);

        let videos = fixture.messenger.sent_videos();
        assert!(videos[0].thumbnail.is_none());
    }

    #[tokio::test]
    async fn test_summary_failure_does_not_fail_publish() {
        let fixture = setup(PublisherConfig::default());
        let dir = fixture._tmp.path().to_path_buf();
        let files = vec![downloaded_file(&dir, "720p").await];

        fixture.messenger.fail_next_text("flood wait");

        let outcome = fixture.publisher.publish(&test_job(), &files).await;
        assert_eq!(outcome.uploaded, 1);
        assert!(fixture.messenger.sent_texts().is_empty());

        // The episode still counts as published.
        let episode = fixture.catalog.get_episode(42, 6).unwrap().unwrap();
        assert_eq!(episode.status, EpisodeStatus::Published);
    }
}
