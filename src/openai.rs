//! OpenAI client configuration with sensible defaults.

use crate::error::{MortError, Result};
use async_openai::error::{ApiError, OpenAIError};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Default timeout for OpenAI API requests (2 minutes).
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Create an OpenAI client for the given API key with the default timeout.
pub fn create_client(api_key: &str) -> Result<Client<OpenAIConfig>> {
    create_client_with_timeout(api_key, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
}

/// Create an OpenAI client with a custom timeout.
///
/// The key is passed explicitly so no client ever reads process-wide state.
pub fn create_client_with_timeout(api_key: &str, timeout: Duration) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| MortError::Config(format!("Failed to create HTTP client: {}", e)))?;

    let config = OpenAIConfig::new().with_api_key(api_key);
    Ok(Client::with_config(config).with_http_client(http_client))
}

/// Error codes that no amount of retrying will fix.
const CONFIG_ERROR_CODES: &[&str] = &[
    "invalid_api_key",
    "invalid_organization",
    "model_not_found",
    "unsupported_country_region_territory",
];

/// Map an API failure to a crate error.
///
/// Rejected credentials and unknown models become `Config`; malformed
/// requests become `InvalidInput`; everything else goes through `transient`.
pub fn map_error<F>(err: OpenAIError, action: &str, transient: F) -> MortError
where
    F: FnOnce(String) -> MortError,
{
    match &err {
        OpenAIError::ApiError(api) if is_config_error(api) => {
            MortError::Config(format!("OpenAI rejected the {} request: {}", action, api.message))
        }
        OpenAIError::InvalidArgument(msg) => {
            MortError::InvalidInput(format!("Invalid {} request: {}", action, msg))
        }
        _ => transient(format!("{} failed: {}", action, err)),
    }
}

fn is_config_error(api: &ApiError) -> bool {
    api.code
        .as_deref()
        .is_some_and(|code| CONFIG_ERROR_CODES.contains(&code))
        || matches!(
            api.r#type.as_deref(),
            Some("authentication_error" | "permission_error")
        )
}
