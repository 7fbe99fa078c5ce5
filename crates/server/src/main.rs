mod api;
mod metrics;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use animebot_core::catalog::{CatalogStore, SqliteCatalog};
use animebot_core::detector::UpdateDetector;
use animebot_core::downloader::Downloader;
use animebot_core::messenger::{Messenger, TelegramMessenger};
use animebot_core::metadata::{AniListClient, MetadataClient};
use animebot_core::publisher::{CoverArtRenderer, Publisher};
use animebot_core::queue::{QueueStore, SqliteQueue};
use animebot_core::resolver::{ConsumetClient, SourceResolver};
use animebot_core::stats::{SqliteStats, StatsStore};
use animebot_core::{load_config, validate_config, Orchestrator};

use api::create_router;
use state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("ANIMEBOT_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully (version {})", VERSION);
    info!("Database path: {:?}", config.database.path);
    info!("Download directory: {:?}", config.downloader.download_dir);

    // Config hash, logged so deployments can be told apart.
    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!("Config hash: {}", &config_hash[..16]);

    // Stores share one SQLite database file.
    let catalog: Arc<dyn CatalogStore> = Arc::new(
        SqliteCatalog::new(&config.database.path).context("Failed to create catalog store")?,
    );
    info!("Catalog store initialized");

    let queue: Arc<dyn QueueStore> = Arc::new(
        SqliteQueue::new(&config.database.path).context("Failed to create work queue")?,
    );
    info!("Work queue initialized");

    let stats: Arc<dyn StatsStore> = Arc::new(
        SqliteStats::new(&config.database.path).context("Failed to create stats store")?,
    );
    info!("Stats store initialized");

    // External clients
    let api_timeout = Duration::from_secs(config.apis.timeout_secs);
    let metadata: Arc<dyn MetadataClient> = Arc::new(
        AniListClient::new(&config.apis.anilist_url, api_timeout)
            .context("Failed to create AniList client")?,
    );
    let resolver: Arc<dyn SourceResolver> = Arc::new(
        ConsumetClient::new(&config.apis.consumet_url, api_timeout)
            .context("Failed to create Consumet client")?,
    );
    let messenger: Arc<dyn Messenger> = Arc::new(
        TelegramMessenger::new(&config.telegram.bot_token)
            .context("Failed to create Telegram client")?,
    );

    // Pipeline stages
    let detector = Arc::new(UpdateDetector::new(
        Arc::clone(&catalog),
        Arc::clone(&queue),
        Arc::clone(&metadata),
        Arc::clone(&resolver),
        Duration::from_secs(config.orchestrator.per_series_delay_secs),
    ));

    let downloader = Arc::new(
        Downloader::new(config.downloader.clone()).context("Failed to create downloader")?,
    );

    let thumbnails =
        CoverArtRenderer::new(api_timeout).context("Failed to create thumbnail renderer")?;

    let publisher = Arc::new(Publisher::new(
        Arc::clone(&messenger),
        Some(Arc::new(thumbnails)),
        Arc::clone(&catalog),
        Arc::clone(&stats),
        config.telegram.clone(),
        config.publisher.clone(),
    ));

    // Create orchestrator if enabled
    let orchestrator = if config.orchestrator.enabled {
        let orch = Arc::new(Orchestrator::new(
            config.orchestrator.clone(),
            Arc::clone(&catalog),
            Arc::clone(&queue),
            Arc::clone(&stats),
            detector,
            downloader,
            publisher,
            Arc::clone(&messenger),
            config.telegram.clone(),
        ));
        orch.start().await;
        info!("Orchestrator started");
        Some(orch)
    } else {
        info!("Orchestrator disabled in config");
        None
    };

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        catalog,
        queue,
        stats,
        metadata,
        orchestrator.clone(),
    ));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Stop orchestrator if running
    if let Some(ref orch) = orchestrator {
        info!("Stopping orchestrator...");
        orch.stop().await;
        info!("Orchestrator stopped");
    }

    info!("Server shut down");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
