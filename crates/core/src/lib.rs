pub mod catalog;
pub mod config;
pub mod detector;
pub mod downloader;
pub mod messenger;
pub mod metadata;
pub mod metrics;
pub mod orchestrator;
pub mod publisher;
pub mod queue;
pub mod resolver;
pub mod stats;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use orchestrator::{Orchestrator, OrchestratorConfig, OrchestratorStatus};
