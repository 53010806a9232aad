use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use super::reply::extract_reply_text;
use super::session::SessionMode;
use super::types::{ApiError, Content, GenerateContentRequest, GenerateContentResponse, ModelInfo};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const DEFAULT_MODEL: &str = "gemini-2.0-flash-lite-001";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, thiserror::Error)]
pub enum GeminiError {
    #[error("GEMINI_API_KEY not set. Get one at https://aistudio.google.com/apikey")]
    ApiKeyNotSet,

    #[error("API rate limit exceeded. Please retry later.")]
    RateLimited,

    #[error("API quota exhausted: {0}")]
    QuotaExhausted(String),

    #[error("prompt blocked by the model: {0}")]
    Blocked(String),

    #[error("empty response from the model")]
    EmptyResponse,

    #[error("API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

#[derive(Clone)]
struct ApiKey(String);

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// HTTP client for the Gemini `generateContent` API.
///
/// Configuration via environment variables:
/// - `GEMINI_API_KEY`: required
/// - `GEMINI_MODEL`: model id (default `gemini-2.0-flash-lite-001`)
#[derive(Clone, Debug)]
pub struct GeminiClient {
    http: Client,
    api_key: ApiKey,
    model: String,
    base_url: String,
    pub(super) session_mode: SessionMode,
}

impl GeminiClient {
    /// Builds a client from `GEMINI_API_KEY` / `GEMINI_MODEL` as returned by
    /// `lookup` (the process environment in production).
    pub fn from_lookup(
        http: Client,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, GeminiError> {
        let api_key = lookup("GEMINI_API_KEY")
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or(GeminiError::ApiKeyNotSet)?;
        let model = lookup("GEMINI_MODEL")
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        Ok(Self {
            http,
            api_key: ApiKey(api_key),
            model,
            base_url: API_BASE.to_string(),
            session_mode: SessionMode::default(),
        })
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(http: Client, base_url: &str) -> Self {
        Self {
            http,
            api_key: ApiKey("test-key".to_string()),
            model: DEFAULT_MODEL.to_string(),
            base_url: base_url.to_string(),
            session_mode: SessionMode::default(),
        }
    }

    pub fn with_session_mode(mut self, mode: SessionMode) -> Self {
        self.session_mode = mode;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Looks up the configured model. Fails on a bad key, unknown model, or
    /// unreachable endpoint before any prompt is sent.
    pub async fn verify_model(&self) -> Result<(), GeminiError> {
        let url = format!("{}/{}", self.base_url, self.model);
        debug_assert!(
            url.starts_with("https://") || cfg!(test),
            "API key must only be sent over HTTPS"
        );

        let response = self
            .http
            .get(&url)
            .header("x-goog-api-key", &self.api_key.0)
            .header("User-Agent", crate::USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let error = serde_json::from_str::<ModelInfo>(&text)
                .ok()
                .and_then(|info| info.error);
            return Err(status_error(status, error.as_ref(), &text));
        }

        let info: ModelInfo = response.json().await?;
        debug!(
            model = %self.model,
            display_name = info.display_name.as_deref().unwrap_or(""),
            "Gemini model available"
        );
        Ok(())
    }

    /// Sends `contents` as one `generateContent` call and returns the reply text.
    pub async fn generate(&self, contents: &[Content]) -> Result<String, GeminiError> {
        let url = format!("{}/{}:generateContent", self.base_url, self.model);
        let request = GenerateContentRequest { contents };

        debug_assert!(
            url.starts_with("https://") || cfg!(test),
            "API key must only be sent over HTTPS"
        );

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key.0)
            .header("User-Agent", crate::USER_AGENT)
            .json(&request)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let error = serde_json::from_str::<GenerateContentResponse>(&text)
                .ok()
                .and_then(|body| body.error);
            return Err(status_error(status, error.as_ref(), &text));
        }

        let body: GenerateContentResponse = response.json().await?;
        debug!(model = %self.model, turns = contents.len(), "gemini generate complete");

        if let Some(err) = &body.error {
            let classified = classify_api_error(err);
            warn!(error = %classified, "Gemini API error in 200 response");
            return Err(classified);
        }

        extract_reply_text(&body)
    }
}

fn status_error(status: StatusCode, error: Option<&ApiError>, text: &str) -> GeminiError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        warn!("Gemini API rate limited");
        return GeminiError::RateLimited;
    }
    if let Some(err) = error {
        let classified = classify_api_error(err);
        warn!(error = %classified, "Gemini API error");
        return classified;
    }
    let end = text.floor_char_boundary(200);
    warn!(status = %status, "Gemini API error (no structured body)");
    GeminiError::Api {
        code: status.as_u16(),
        message: format!("HTTP {status}: {}", &text[..end]),
    }
}

fn classify_api_error(err: &ApiError) -> GeminiError {
    let message = err
        .message
        .clone()
        .unwrap_or_else(|| "Unknown error".to_string());

    match err.code {
        Some(429) => GeminiError::RateLimited,
        Some(403) => GeminiError::QuotaExhausted(message),
        Some(code) => GeminiError::Api { code, message },
        None => GeminiError::Api {
            code: 0,
            message: format!("Unknown error (no status code): {message}"),
        },
    }
}
