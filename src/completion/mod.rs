//! LLM completion for answering questions from retrieved context.

mod openai;

pub use openai::OpenAICompleter;

use crate::config::Prompts;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// Trait for completion backends.
#[async_trait]
pub trait Completer: Send + Sync {
    /// Answer `question` from `context` using the prompt templates.
    async fn complete(&self, prompts: &Prompts, context: &[String], question: &str) -> Result<String>;
}

/// Join every context text into one block ("stuff" strategy).
pub fn stuff_context(context: &[String]) -> String {
    context
        .iter()
        .map(|text| text.trim())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Render the user prompt for a question and its context.
pub fn build_user_prompt(prompts: &Prompts, context: &[String], question: &str) -> String {
    let mut vars = HashMap::new();
    vars.insert("question".to_string(), question.to_string());
    vars.insert("context".to_string(), stuff_context(context));
    prompts.render_with_custom(&prompts.qa.user, &vars)
}
