//! Service credentials.
//!
//! Secrets come from the environment first and the config file second.
//! A missing or empty secret is fatal for every command that reaches a service.

use super::Settings;
use crate::error::{MortError, Result};

pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const PINECONE_API_KEY: &str = "PINECONE_API_KEY";
pub const PINECONE_API_ENV: &str = "PINECONE_API_ENV";

/// Credentials needed to reach OpenAI and Pinecone.
#[derive(Clone)]
pub struct Secrets {
    pub openai_api_key: String,
    pub pinecone_api_key: String,
    pub pinecone_environment: String,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("openai_api_key", &mask(&self.openai_api_key))
            .field("pinecone_api_key", &mask(&self.pinecone_api_key))
            .field("pinecone_environment", &self.pinecone_environment)
            .finish()
    }
}

impl Secrets {
    /// Resolve secrets from the process environment, falling back to settings.
    pub fn resolve(settings: &Settings) -> Result<Self> {
        Self::resolve_with(settings, |name| std::env::var(name).ok())
    }

    /// Resolve secrets using a custom variable lookup.
    pub fn resolve_with<F>(settings: &Settings, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let openai_api_key = pick(OPENAI_API_KEY, lookup(OPENAI_API_KEY), settings.openai.api_key.as_deref())?;
        let pinecone_api_key = pick(
            PINECONE_API_KEY,
            lookup(PINECONE_API_KEY),
            settings.pinecone.api_key.as_deref(),
        )?;
        let pinecone_environment = pick(
            PINECONE_API_ENV,
            lookup(PINECONE_API_ENV),
            settings.pinecone.environment.as_deref(),
        )?;

        Ok(Self {
            openai_api_key,
            pinecone_api_key,
            pinecone_environment,
        })
    }
}

fn pick(name: &str, from_env: Option<String>, from_config: Option<&str>) -> Result<String> {
    from_env
        .filter(|v| !v.trim().is_empty())
        .or_else(|| {
            from_config
                .filter(|v| !v.trim().is_empty())
                .map(str::to_string)
        })
        .ok_or_else(|| {
            MortError::Config(format!(
                "{} not set. Set it with: export {}='...' (or in the config file)",
                name, name
            ))
        })
}

/// Mask a secret for display, keeping a short prefix and suffix.
pub fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 12 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}
