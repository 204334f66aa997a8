//! Configuration module for Mort.
//!
//! Handles loading application settings, service secrets and prompt templates.

mod prompts;
mod secrets;
mod settings;

pub use prompts::{Prompts, QaPrompts};
pub use secrets::{mask, Secrets, OPENAI_API_KEY, PINECONE_API_ENV, PINECONE_API_KEY};
pub use settings::{
    CompletionSettings, EmbeddingSettings, GeneralSettings, OpenAISettings, PineconeSettings,
    PromptSettings, RetrievalSettings, RetrySettings, Settings,
};
