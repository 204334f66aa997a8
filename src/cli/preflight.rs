//! Pre-flight checks before contacting the services.
//!
//! Validates that secrets and index configuration are present before any
//! network call, so a missing key fails at startup instead of mid-query.

use crate::config::{Secrets, Settings};
use crate::error::{MortError, Result};
use crate::rag::MAX_TOP_K;

/// Resolve secrets and validate the index configuration.
pub fn check(settings: &Settings) -> Result<Secrets> {
    check_with(settings, |name| std::env::var(name).ok())
}

/// [`check`] with a custom environment lookup.
pub fn check_with<F>(settings: &Settings, lookup: F) -> Result<Secrets>
where
    F: Fn(&str) -> Option<String>,
{
    if settings.pinecone.index_name.trim().is_empty() {
        return Err(MortError::Config(
            "pinecone.index_name is empty. Set it with: mort config set pinecone.index_name <name>"
                .to_string(),
        ));
    }
    if settings.retrieval.top_k == 0 || settings.retrieval.top_k > MAX_TOP_K {
        return Err(MortError::Config(format!(
            "retrieval.top_k must be between 1 and {}",
            MAX_TOP_K
        )));
    }

    Secrets::resolve_with(settings, lookup)
}
