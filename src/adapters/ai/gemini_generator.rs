//! Gemini text generator - implementation of TextGenerator for Google's
//! Generative Language API.
//!
//! # Configuration
//!
//! ```ignore
//! let config = GeminiConfig::new(api_key)
//!     .with_model("gemini-2.5-pro")
//!     .with_timeout(Duration::from_secs(20));
//!
//! let generator = GeminiTextGenerator::new(config)?;
//! ```
//!
//! The raw response is reduced to a [`GenerationEnvelope`] before anything
//! else looks at it.

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ports::{GenerationEnvelope, GenerationError, TextGenerator};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-pro";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Configuration for the Gemini generator.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    api_key: Secret<String>,
    pub model: String,
    pub base_url: String,
    /// HTTP-level timeout. The coordinator applies its own bound on top.
    pub timeout: Duration,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            timeout: Duration::from_secs(20),
            temperature: 0.7,
            max_output_tokens: 2000,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_output_tokens(mut self, max: u32) -> Self {
        self.max_output_tokens = max;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// Gemini API generator.
pub struct GeminiTextGenerator {
    config: GeminiConfig,
    client: Client,
}

impl GeminiTextGenerator {
    /// # Errors
    ///
    /// `Unavailable` if the HTTP client cannot be built (TLS backend missing).
    pub fn new(config: GeminiConfig) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GenerationError::Unavailable(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    fn to_gemini_request(&self, prompt: &str) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_output_tokens,
                top_p: 0.8,
                top_k: 40,
            },
        }
    }

    async fn send_request(&self, prompt: &str) -> Result<Response, GenerationError> {
        self.client
            .post(self.generate_url())
            .header("x-goog-api-key", self.config.api_key())
            .header("Content-Type", "application/json")
            .json(&self.to_gemini_request(prompt))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Timeout {
                        timeout_secs: self.config.timeout.as_secs(),
                    }
                } else if e.is_connect() {
                    GenerationError::Unavailable(format!("Connection failed: {}", e))
                } else {
                    GenerationError::Unavailable(e.to_string())
                }
            })
    }

    async fn handle_response_status(&self, response: Response) -> Result<Response, GenerationError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<GeminiResponse>(&error_body)
            .ok()
            .and_then(|r| r.error)
            .map(|e| e.message)
            .unwrap_or(error_body);

        match status.as_u16() {
            400 | 401 | 403 | 404 | 429 => Err(GenerationError::Rejected(format!(
                "status {}: {}",
                status, detail
            ))),
            500..=599 => Err(GenerationError::Unavailable(format!(
                "Server error {}: {}",
                status, detail
            ))),
            _ => Err(GenerationError::Unavailable(format!(
                "Unexpected status {}: {}",
                status, detail
            ))),
        }
    }
}

#[async_trait]
impl TextGenerator for GeminiTextGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let response = self.send_request(prompt).await?;
        let response = self.handle_response_status(response).await?;
        let body = response
            .text()
            .await
            .map_err(|e| GenerationError::Unavailable(format!("Failed to read body: {}", e)))?;

        parse_envelope(&body)?.into_result()
    }

    fn provider_name(&self) -> &str {
        "gemini"
    }
}

/// Reduces a Gemini response body to the typed envelope.
///
/// Text from every part of every candidate is concatenated; an API error or
/// a prompt block becomes the envelope error.
pub(crate) fn parse_envelope(body: &str) -> Result<GenerationEnvelope, GenerationError> {
    let parsed: GeminiResponse =
        serde_json::from_str(body).map_err(|e| GenerationError::Parse(e.to_string()))?;

    if let Some(error) = parsed.error {
        return Ok(GenerationEnvelope::error(error.message));
    }
    if let Some(reason) = parsed.prompt_feedback.and_then(|f| f.block_reason) {
        return Ok(GenerationEnvelope::error(format!("prompt blocked: {}", reason)));
    }

    let text: String = parsed
        .candidates
        .unwrap_or_default()
        .into_iter()
        .filter_map(|c| c.content)
        .flat_map(|c| c.parts)
        .filter_map(|p| p.text)
        .collect();

    Ok(GenerationEnvelope {
        text: if text.is_empty() { None } else { Some(text) },
        error: None,
    })
}

// ════════════════════════════════════════════════════════════════════════════════
// Gemini wire types
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    top_p: f32,
    top_k: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    prompt_feedback: Option<PromptFeedback>,
    error: Option<GeminiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_camel_case_generation_config() {
        let generator = GeminiTextGenerator::new(GeminiConfig::new("key")).unwrap();
        let json = serde_json::to_value(generator.to_gemini_request("hello")).unwrap();

        assert_eq!(json["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 2000);
        assert_eq!(json["generationConfig"]["topK"], 40);
    }

    #[test]
    fn url_includes_model_and_action() {
        let generator = GeminiTextGenerator::new(
            GeminiConfig::new("key")
                .with_base_url("http://localhost:9000/")
                .with_model("gemini-test"),
        )
        .unwrap();
        assert_eq!(
            generator.generate_url(),
            "http://localhost:9000/v1beta/models/gemini-test:generateContent"
        );
    }

    #[test]
    fn parses_candidate_text() {
        let body = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hello "},{"text":"there"}]}}]}"#;
        let envelope = parse_envelope(body).unwrap();
        assert_eq!(envelope.into_result().unwrap(), "Hello there");
    }

    #[test]
    fn blocked_prompt_is_rejected() {
        let body = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        let result = parse_envelope(body).unwrap().into_result();
        assert!(matches!(result, Err(GenerationError::Rejected(msg)) if msg.contains("SAFETY")));
    }

    #[test]
    fn empty_candidates_are_empty_response() {
        let result = parse_envelope(r#"{"candidates":[]}"#).unwrap().into_result();
        assert_eq!(result, Err(GenerationError::EmptyResponse));
    }

    #[test]
    fn garbage_is_parse_error() {
        assert!(matches!(parse_envelope("<html>"), Err(GenerationError::Parse(_))));
    }
}
