//! Question answering engine.

use super::context::context_texts;
use crate::aggregate::{aggregate, render_markdown, ResourceGroup};
use crate::completion::Completer;
use crate::config::Prompts;
use crate::error::{MortError, Result};
use crate::retrieval::{RetrievedDocument, Retriever};
use crate::retry::RetryPolicy;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Default number of chunks fetched per question.
pub const DEFAULT_TOP_K: usize = 10;

/// Largest `top_k` the index accepts for one query.
pub const MAX_TOP_K: usize = 10_000;

/// Answers questions from the knowledge base.
///
/// Built once by the entry point from explicit collaborators and shared by
/// reference afterwards.
pub struct QaEngine {
    retriever: Arc<dyn Retriever>,
    completer: Arc<dyn Completer>,
    prompts: Prompts,
    top_k: usize,
    retry: RetryPolicy,
}

impl QaEngine {
    /// Create a new engine with default prompts, `top_k` and retry policy.
    pub fn new(retriever: Arc<dyn Retriever>, completer: Arc<dyn Completer>) -> Self {
        Self {
            retriever,
            completer,
            prompts: Prompts::default(),
            top_k: DEFAULT_TOP_K,
            retry: RetryPolicy::default(),
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Set how many chunks to retrieve per question.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.clamp(1, MAX_TOP_K);
        self
    }

    /// Set the retry policy for the external calls.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Ask a question using the configured `top_k`.
    pub async fn ask(&self, question: &str) -> Result<QaResponse> {
        self.ask_with(question, self.top_k).await
    }

    /// Ask a question, retrieving `top_k` chunks.
    ///
    /// Retrieval and completion are retried together; if both budgets run out
    /// the error is returned and no partial answer is produced.
    #[instrument(skip(self), fields(question = %question))]
    pub async fn ask_with(&self, question: &str, top_k: usize) -> Result<QaResponse> {
        let question = validate_query(question)?;
        let top_k = validate_top_k(top_k)?;
        info!("Processing question: {}", question);

        let retriever = &self.retriever;
        let completer = &self.completer;
        let prompts = &self.prompts;

        let (documents, answer) = self
            .retry
            .run("question answering", || async move {
                let documents = retriever.retrieve(question, top_k).await?;
                let context = context_texts(&documents);
                let answer = completer.complete(prompts, &context, question).await?;
                Ok((documents, answer))
            })
            .await?;

        let sources = aggregate(&documents);
        debug!(
            "Answered from {} chunks grouped into {} sources",
            documents.len(),
            sources.len()
        );

        Ok(QaResponse {
            question: question.to_string(),
            answer,
            retrieved: documents.len(),
            sources,
        })
    }

    /// Retrieve and group sources without asking the LLM.
    #[instrument(skip(self), fields(query = %query))]
    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<ResourceGroup>> {
        let documents = self.retrieve(query, top_k).await?;
        Ok(aggregate(&documents))
    }

    /// Retrieve raw chunks, with retries.
    pub async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<RetrievedDocument>> {
        let query = validate_query(query)?;
        let top_k = validate_top_k(top_k)?;
        let retriever = &self.retriever;

        self.retry
            .run("retrieval", || async move { retriever.retrieve(query, top_k).await })
            .await
    }
}

fn validate_query(query: &str) -> Result<&str> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(MortError::InvalidInput("question is empty".to_string()));
    }
    Ok(trimmed)
}

/// Zero is read as one; anything above [`MAX_TOP_K`] is rejected.
fn validate_top_k(top_k: usize) -> Result<usize> {
    if top_k > MAX_TOP_K {
        return Err(MortError::InvalidInput(format!(
            "top_k must be at most {}, got {}",
            MAX_TOP_K, top_k
        )));
    }
    Ok(top_k.max(1))
}

/// An answer together with the grouped sources it was built from.
#[derive(Debug, Clone)]
pub struct QaResponse {
    pub question: String,
    /// The generated answer.
    pub answer: String,
    /// Number of chunks retrieved before grouping.
    pub retrieved: usize,
    /// Sources grouped per resource, in retrieval order.
    pub sources: Vec<ResourceGroup>,
}

impl QaResponse {
    /// Format the response as markdown.
    pub fn format_for_display(&self) -> String {
        let mut output = format!("**Question**: {}\n\n**Answer**: {}\n", self.question, self.answer);

        if !self.sources.is_empty() {
            output.push_str("\n## Sources\n\n");
            output.push_str(&render_markdown(&self.sources));
        }

        output
    }
}
