//! # Gemini API Client
//!
//! Sends a review prompt to Google's Gemini `generateContent` endpoint and
//! returns the raw response text. The model identifier is fixed; only the
//! endpoint and timeout come from configuration.
//!
//! Exactly one attempt is made per call. Failures are classified into
//! `ModelErrorKind` so the caller can tell a bad key from a quota problem
//! from a dead network.

use std::future::Future;
use std::time::Duration;

use serde::Deserialize;

use crate::config::ModelConfig;
use crate::error::{MigReviewError, ModelErrorKind, Result};

/// The Gemini model every review is sent to.
pub const MODEL_ID: &str = "gemini-2.0-flash";

/// Anything that can turn a prompt into raw model text.
pub trait ModelClient {
    fn generate(&self, prompt: &str) -> impl Future<Output = Result<String>> + Send;
}

/// A Gemini API key. Never printed: `Debug` is redacted and there is no
/// `Display`.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a key, rejecting blank input.
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let key = key.into().trim().to_string();
        if key.is_empty() {
            return Err(MigReviewError::MissingCredential);
        }
        Ok(ApiKey(key))
    }

    /// Read `GEMINI_API_KEY` from the environment.
    pub fn from_env() -> Result<Self> {
        match std::env::var("GEMINI_API_KEY") {
            Ok(key) => ApiKey::new(key),
            Err(_) => Err(MigReviewError::MissingCredential),
        }
    }

    fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Production client for the Gemini API.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    api_key: ApiKey,
    url: url::Url,
    timeout: Duration,
    http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(api_key: ApiKey, config: &ModelConfig) -> Result<Self> {
        let url = generate_content_url(&config.endpoint)?;
        let timeout = Duration::from_secs(config.timeout_secs);
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MigReviewError::Other(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            url,
            timeout,
            http,
        })
    }

    /// The `generateContent` URL requests are posted to.
    pub fn url(&self) -> &url::Url {
        &self.url
    }
}

impl ModelClient for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "contents": [
                {
                    "role": "user",
                    "parts": [{ "text": prompt }]
                }
            ]
        });

        tracing::info!("Sending review prompt to {} ({} bytes)", MODEL_ID, prompt.len());

        // The key goes in a header so it never shows up in a URL that
        // reqwest might echo back in an error message.
        let response = self
            .http
            .post(self.url.clone())
            .header("x-goog-api-key", self.api_key.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| transport_error(e, self.timeout))?;

        if !status.is_success() {
            let kind = classify_status(status.as_u16(), &response_text);
            tracing::warn!("Gemini API returned {} ({})", status, kind);
            return Err(MigReviewError::model(
                kind,
                format!("HTTP {}: {}", status, error_message(&response_text)),
            ));
        }

        let text = extract_candidate_text(&response_text)?;
        tracing::debug!("Gemini response text: {} bytes", text.len());
        Ok(text)
    }
}

/// Build `{endpoint}/models/{MODEL_ID}:generateContent`.
pub fn generate_content_url(endpoint: &str) -> Result<url::Url> {
    let raw = format!(
        "{}/models/{}:generateContent",
        endpoint.trim_end_matches('/'),
        MODEL_ID
    );
    url::Url::parse(&raw).map_err(|e| MigReviewError::Config {
        message: format!("Invalid model endpoint '{}': {}", endpoint, e),
    })
}

fn transport_error(e: reqwest::Error, timeout: Duration) -> MigReviewError {
    if e.is_timeout() {
        return MigReviewError::model(
            ModelErrorKind::Network,
            format!("request timed out after {}s", timeout.as_secs()),
        );
    }
    MigReviewError::model(ModelErrorKind::Network, e.without_url().to_string())
}

/// Classify a non-success HTTP response.
pub fn classify_status(status: u16, body: &str) -> ModelErrorKind {
    match status {
        401 | 403 => ModelErrorKind::Auth,
        429 => ModelErrorKind::Quota,
        400 if body.contains("API_KEY_INVALID") || body.contains("API key not valid") => {
            ModelErrorKind::Auth
        }
        _ if body.contains("RESOURCE_EXHAUSTED") => ModelErrorKind::Quota,
        _ => ModelErrorKind::Unknown,
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Pull `error.message` out of a Gemini error body, or fall back to the
/// (truncated) body itself.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(env) if !env.error.message.is_empty() => env.error.message,
        _ => truncate(body, 500).to_string(),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

/// Concatenate the text parts of the first candidate.
pub fn extract_candidate_text(body: &str) -> Result<String> {
    let parsed: GenerateContentResponse = serde_json::from_str(body).map_err(|e| {
        MigReviewError::model(
            ModelErrorKind::Unknown,
            format!("Failed to parse Gemini API response JSON: {}", e),
        )
    })?;

    let Some(candidate) = parsed.candidates.first() else {
        let reason = parsed
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .unwrap_or_else(|| "no candidates".to_string());
        return Err(MigReviewError::model(
            ModelErrorKind::Unknown,
            format!("Gemini returned no answer ({})", reason),
        ));
    };

    let text: String = candidate
        .content
        .iter()
        .flat_map(|c| c.parts.iter())
        .filter_map(|p| p.text.as_deref())
        .collect();

    if text.is_empty() {
        return Err(MigReviewError::model(
            ModelErrorKind::Unknown,
            format!(
                "Gemini answer contained no text (finishReason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            ),
        ));
    }

    Ok(text)
}

fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
