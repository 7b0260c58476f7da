//! Gemini `generateContent` REST client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use folio_core::config::LlmConfig;
use folio_core::errors::GenerationError;

use crate::llm::LlmClient;

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: Option<SecretString>,
    base_url: String,
    model: String,
}

impl GeminiClient {
    /// Builds a client even without a credential; requests then fail fast
    /// with [`GenerationError::MissingCredential`].
    pub fn from_config(config: &LlmConfig) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GenerationError::Upstream(format!("http client init failed: {e}")))?;

        let api_key = config.api_key.clone().filter(|key| !key.expose_secret().trim().is_empty());
        if api_key.is_none() {
            warn!(
                event_name = "generation.config.missing_api_key",
                correlation_id = "bootstrap",
                "generation api key is not configured; set FOLIO_LLM_API_KEY or GEMINI_API_KEY"
            );
        }

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
        let api_key = self.api_key.as_ref().ok_or(GenerationError::MissingCredential)?;

        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part { text: prompt.to_string() }],
            }],
        };

        debug!(model = %self.model, prompt_chars = prompt.len(), "sending generateContent request");

        let response = self
            .client
            .post(self.endpoint())
            .header(API_KEY_HEADER, api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|err| GenerationError::Upstream(format!("request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error body".to_string());
            return Err(map_http_error(status, &body_text));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|err| GenerationError::Upstream(format!("undecodable response: {err}")))?;

        extract_text(parsed)
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Debug, Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

fn extract_text(response: GenerateContentResponse) -> Result<String, GenerationError> {
    let text: String = response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts.into_iter().filter_map(|part| part.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(GenerationError::EmptyResponse);
    }
    Ok(text)
}

fn map_http_error(status: StatusCode, body: &str) -> GenerationError {
    let detail = serde_json::from_str::<ErrorWrapper>(body)
        .ok()
        .map(|wrapper| {
            let message = wrapper.error.message.unwrap_or_else(|| body.to_string());
            match wrapper.error.status {
                Some(status_text) if !status_text.is_empty() => format!("{status_text}: {message}"),
                _ => message,
            }
        })
        .unwrap_or_else(|| body.to_string());

    GenerationError::Upstream(format!("HTTP {}: {detail}", status.as_u16()))
}
