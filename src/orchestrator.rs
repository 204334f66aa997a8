//! Wiring of the external service clients.
//!
//! Every client is constructed here, once, from explicit configuration and
//! handed to the engine. Nothing reads process-wide state after startup.

use crate::completion::{Completer, OpenAICompleter};
use crate::config::{Prompts, Secrets, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::Result;
use crate::openai::create_client_with_timeout;
use crate::rag::QaEngine;
use crate::retrieval::{PineconeIndex, PineconeRetriever, Retriever};
use async_openai::config::OpenAIConfig;
use async_openai::Client;
use std::sync::Arc;
use tracing::info;

/// Holds the configured service clients.
pub struct Orchestrator {
    settings: Settings,
    prompts: Prompts,
    openai: Client<OpenAIConfig>,
    retriever: Arc<dyn Retriever>,
}

impl Orchestrator {
    /// Load prompts and connect to the services with resolved secrets.
    pub async fn connect(settings: Settings, secrets: Secrets) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let openai = create_client_with_timeout(
            &secrets.openai_api_key,
            settings.completion.request_timeout(),
        )?;

        let embedder: Arc<dyn Embedder> = Arc::new(
            OpenAIEmbedder::new(openai.clone(), &settings.embedding.model)
                .with_dimensions(settings.embedding.dimensions),
        );

        let index = PineconeIndex::connect(&settings.pinecone, &secrets).await?;
        let retriever: Arc<dyn Retriever> = Arc::new(PineconeRetriever::new(embedder, index));

        info!(
            "Connected (embedding: {}, completion: {}, top_k: {})",
            settings.embedding.model, settings.completion.model, settings.retrieval.top_k
        );

        Ok(Self::with_components(settings, prompts, openai, retriever))
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        openai: Client<OpenAIConfig>,
        retriever: Arc<dyn Retriever>,
    ) -> Self {
        Self {
            settings,
            prompts,
            openai,
            retriever,
        }
    }

    /// Build a question answering engine, optionally overriding the model.
    pub fn engine(&self, model: Option<&str>) -> QaEngine {
        let mut completer = OpenAICompleter::new(self.openai.clone(), &self.settings.completion);
        if let Some(model) = model.filter(|m| !m.trim().is_empty()) {
            completer = completer.with_model(model);
        }
        let completer: Arc<dyn Completer> = Arc::new(completer);

        QaEngine::new(self.retriever.clone(), completer)
            .with_prompts(self.prompts.clone())
            .with_top_k(self.settings.retrieval.top_k)
            .with_retry(self.settings.retry.policy())
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}
