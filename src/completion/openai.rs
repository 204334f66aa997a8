//! OpenAI chat-completion backend.

use super::{build_user_prompt, Completer};
use crate::config::{CompletionSettings, Prompts};
use crate::error::{MortError, Result};
use crate::openai::map_error;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Answers questions with an OpenAI chat model.
pub struct OpenAICompleter {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAICompleter {
    pub fn new(client: Client<OpenAIConfig>, settings: &CompletionSettings) -> Self {
        Self {
            client,
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        }
    }

    /// Use a different model than the configured one.
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Completer for OpenAICompleter {
    #[instrument(skip(self, prompts, context), fields(model = %self.model, chunks = context.len()))]
    async fn complete(&self, prompts: &Prompts, context: &[String], question: &str) -> Result<String> {
        let user_prompt = build_user_prompt(prompts, context, question);

        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(prompts.qa.system.clone())
                .build()
                .map_err(|e| MortError::Completion(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_prompt)
                .build()
                .map_err(|e| MortError::Completion(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .max_completion_tokens(self.max_tokens)
            .build()
            .map_err(|e| MortError::Completion(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| map_error(e, "completion", MortError::Completion))?;

        let answer = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| MortError::Completion("Empty response from LLM".to_string()))?
            .trim()
            .to_string();

        debug!("Generated answer of {} chars", answer.len());
        Ok(answer)
    }
}
