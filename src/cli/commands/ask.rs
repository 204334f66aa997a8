//! Ask command implementation.

use super::connect;
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(
    question: &str,
    model: Option<String>,
    top_k: Option<usize>,
    settings: Settings,
) -> Result<()> {
    let top_k = top_k.unwrap_or(settings.retrieval.top_k);
    let orchestrator = connect(settings).await?;
    let engine = orchestrator.engine(model.as_deref());

    let spinner = Output::spinner("Searching knowledge base...");
    let result = engine.ask_with(question, top_k).await;
    spinner.finish_and_clear();

    match result {
        Ok(response) => {
            Output::answer(&response.answer);
            Output::sources(&response.sources);
        }
        Err(e) => {
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
