//! Gemini API key provider (Generative Language API, `generateContent`).

use anyhow::Result;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::{Value, json};

use super::shared::{USER_AGENT, classify_reqwest_error, resolve_api_key, resolve_base_url};
use crate::analysis::{AnalysisError, GenerateRequest, GenerativeService};
use crate::config::GeminiSettings;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const API_KEY_ENV: &str = "GEMINI_API_KEY";
const BASE_URL_ENV: &str = "GEMINI_BASE_URL";

/// Gemini API configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// `None` when no key is configured; requests then fail before sending.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

impl GeminiConfig {
    /// Creates a config from settings and environment.
    ///
    /// Authentication resolution order:
    /// 1. `api_key` in `[gemini]` (from config file)
    /// 2. `GEMINI_API_KEY` environment variable
    ///
    /// Base URL resolution order: `GEMINI_BASE_URL`, then config, then default.
    ///
    /// # Errors
    /// Returns an error if a configured base URL is malformed.
    pub fn from_settings(settings: &GeminiSettings) -> Result<Self> {
        let api_key = resolve_api_key(settings.effective_api_key(), API_KEY_ENV);
        let base_url = resolve_base_url(
            settings.effective_base_url(),
            BASE_URL_ENV,
            DEFAULT_BASE_URL,
            "Gemini",
        )?;

        Ok(Self {
            api_key,
            base_url,
            model: settings.model.clone(),
        })
    }
}

/// Gemini client.
pub struct GeminiClient {
    config: GeminiConfig,
    http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// The key as a header value. A key that cannot be sent as a header is a
    /// configuration error, same as a missing one.
    fn api_key(&self) -> Result<HeaderValue, AnalysisError> {
        let key = self.config.api_key.as_deref().ok_or_else(|| {
            AnalysisError::configuration(format!(
                "API key is missing. Set {API_KEY_ENV} or api_key in [gemini]."
            ))
        })?;
        let mut value = HeaderValue::from_str(key).map_err(|_| {
            AnalysisError::configuration(format!(
                "API key contains characters that cannot be sent in a header. Check {API_KEY_ENV} or api_key in [gemini]."
            ))
        })?;
        value.set_sensitive(true);
        Ok(value)
    }

    async fn generate_content(&self, request: GenerateRequest<'_>) -> Result<String, AnalysisError> {
        let api_key = self.api_key()?;
        let body = build_request(&request);
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url, self.config.model
        );

        tracing::debug!(model = %self.config.model, %url, "POST generateContent");
        let response = self
            .http
            .post(url)
            .headers(build_headers(api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| classify_reqwest_error(&e))?;
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Gemini returned an error status");
            return Err(AnalysisError::http_status(status.as_u16(), &text));
        }

        let value: Value = serde_json::from_str(&text).map_err(|e| {
            AnalysisError::parse(format!("Failed to parse Gemini response JSON: {e}"))
                .with_details(text.clone())
        })?;
        extract_text(&value)
    }
}

impl GenerativeService for GeminiClient {
    fn check_credentials(&self) -> Result<(), AnalysisError> {
        self.api_key().map(|_| ())
    }

    async fn generate(&self, request: GenerateRequest<'_>) -> Result<String, AnalysisError> {
        self.generate_content(request).await
    }
}

fn build_request(request: &GenerateRequest<'_>) -> Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [
                {
                    "inlineData": {
                        "mimeType": request.mime_type,
                        "data": request.data_base64
                    }
                },
                { "text": request.instructions }
            ]
        }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": request.response_schema,
            "temperature": request.temperature
        }
    })
}

/// Concatenates the text parts of the first candidate.
fn extract_text(value: &Value) -> Result<String, AnalysisError> {
    let payload = value.get("response").unwrap_or(value);

    let text: String = payload
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|candidates| candidates.first())
        .and_then(|candidate| candidate.get("content"))
        .and_then(|content| content.get("parts"))
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter(|part| !part.get("thought").and_then(Value::as_bool).unwrap_or(false))
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();

    if !text.trim().is_empty() {
        return Ok(text);
    }

    if let Some(reason) = payload
        .get("promptFeedback")
        .and_then(|feedback| feedback.get("blockReason"))
        .and_then(Value::as_str)
    {
        return Err(AnalysisError::parse(format!(
            "No response from Gemini (blocked: {reason})"
        )));
    }
    Err(AnalysisError::parse("No response from Gemini"))
}

fn build_headers(api_key: HeaderValue) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("x-goog-api-key", api_key);
    headers.insert("accept", HeaderValue::from_static("application/json"));
    headers.insert("content-type", HeaderValue::from_static("application/json"));
    headers.insert("user-agent", HeaderValue::from_static(USER_AGENT));
    headers
}
