//! Search command implementation.

use super::connect;
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(query: &str, top_k: Option<usize>, settings: Settings) -> Result<()> {
    let top_k = top_k.unwrap_or(settings.retrieval.top_k);
    let orchestrator = connect(settings).await?;
    let engine = orchestrator.engine(None);

    let spinner = Output::spinner("Searching...");
    let results = engine.search(query, top_k).await;
    spinner.finish_and_clear();

    match results {
        Ok(groups) => {
            if groups.is_empty() {
                Output::warning("No sources found matching your query.");
            } else {
                Output::success(&format!("Found {} sources", groups.len()));
                for group in &groups {
                    Output::resource_group(group);
                }
                println!();
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
