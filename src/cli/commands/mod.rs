//! CLI command implementations.

mod ask;
mod chat;
mod config;
mod doctor;
mod search;
mod serve;

pub use ask::run_ask;
pub use chat::run_chat;
pub use config::run_config;
pub use doctor::run_doctor;
pub use search::run_search;
pub use serve::run_serve;

use crate::cli::preflight;
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;

/// Check secrets, then connect to the services.
async fn connect(settings: Settings) -> anyhow::Result<Orchestrator> {
    let secrets = match preflight::check(&settings) {
        Ok(secrets) => secrets,
        Err(e) => {
            Output::error(&format!("{}", e));
            Output::info("Run 'mort doctor' for detailed diagnostics.");
            return Err(e.into());
        }
    };

    let spinner = Output::spinner("Connecting to knowledge base...");
    let result = Orchestrator::connect(settings, secrets).await;
    spinner.finish_and_clear();

    match result {
        Ok(orchestrator) => Ok(orchestrator),
        Err(e) => {
            Output::error(&format!("Failed to connect: {}", e));
            Err(e.into())
        }
    }
}
