//! Helpers shared by service clients.

use anyhow::{Context, Result};

use crate::analysis::AnalysisError;

/// Standard User-Agent header for snappal API requests.
pub const USER_AGENT: &str = concat!("snappal/", env!("CARGO_PKG_VERSION"));

/// Resolves an API key with precedence: config > env.
///
/// Returns `None` when neither source has a non-blank key; the client turns
/// that into a configuration error at request time.
pub fn resolve_api_key(config_api_key: Option<&str>, env_var: &str) -> Option<String> {
    if let Some(key) = config_api_key {
        let trimmed = key.trim();
        if !trimmed.is_empty() {
            return Some(trimmed.to_string());
        }
    }

    std::env::var(env_var)
        .ok()
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
}

/// Resolves a base URL with precedence: env > config > default.
///
/// # Errors
/// Returns an error if the chosen URL is not well-formed.
pub fn resolve_base_url(
    config_base_url: Option<&str>,
    env_var: &str,
    default_url: &str,
    provider_name: &str,
) -> Result<String> {
    if let Ok(env_url) = std::env::var(env_var) {
        let trimmed = env_url.trim();
        if !trimmed.is_empty() {
            validate_url(trimmed, provider_name)?;
            return Ok(trimmed.trim_end_matches('/').to_string());
        }
    }

    if let Some(config_url) = config_base_url {
        let trimmed = config_url.trim();
        if !trimmed.is_empty() {
            validate_url(trimmed, provider_name)?;
            return Ok(trimmed.trim_end_matches('/').to_string());
        }
    }

    Ok(default_url.to_string())
}

fn validate_url(url: &str, provider_name: &str) -> Result<()> {
    url::Url::parse(url).with_context(|| format!("Invalid {provider_name} base URL: {url}"))?;
    Ok(())
}

/// Classifies a reqwest error into an `AnalysisError`.
pub fn classify_reqwest_error(e: &reqwest::Error) -> AnalysisError {
    if e.is_timeout() {
        AnalysisError::transport(format!("Request timed out: {e}"))
    } else if e.is_connect() {
        AnalysisError::transport(format!("Connection failed: {e}"))
    } else if e.is_request() {
        AnalysisError::transport(format!("Request error: {e}"))
    } else {
        AnalysisError::transport(format!("Network error: {e}"))
    }
}
