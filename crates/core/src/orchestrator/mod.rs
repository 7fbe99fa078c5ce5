//! Background orchestration of the acquisition pipeline.

mod config;
mod runner;
mod types;

pub use config::OrchestratorConfig;
pub use runner::Orchestrator;
pub use types::OrchestratorStatus;
