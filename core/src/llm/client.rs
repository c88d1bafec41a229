//! Gemini client
//!
//! Calls Google Generative AI `generateContent` once per message with the
//! profile-derived system instruction.

use super::{build_system_prompt, CompletionBackend, LlmConfig};
use crate::config::ConfigError;
use crate::error::{AiError, ErrorKind};
use crate::profile::ProfileContext;
use crate::util::{sanitize_base_url, validate_api_key};
use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client as HttpClient, StatusCode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    system_instruction: GeminiContent<'a>,
    contents: Vec<GeminiContent<'a>>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

pub struct GeminiClient {
    http_client: HttpClient,
    url: String,
    api_key: String,
    model: String,
    system_prompt: String,
    generation_config: GeminiGenerationConfig,
}

impl GeminiClient {
    pub fn new(
        config: &LlmConfig,
        api_key: &str,
        profile: &ProfileContext,
    ) -> Result<Self, ConfigError> {
        let api_key = validate_api_key(api_key)?;
        let base_url = sanitize_base_url(&config.base_url, "base_url")?;
        let http_client = HttpClient::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ConfigError::InvalidUrl {
                field: "base_url",
                reason: e.to_string(),
            })?;

        Ok(Self {
            http_client,
            url: format!("{}/v1beta/models/{}:generateContent", base_url, config.model),
            api_key,
            model: config.model.clone(),
            system_prompt: build_system_prompt(profile),
            generation_config: GeminiGenerationConfig {
                temperature: config.temperature,
                max_output_tokens: config.max_output_tokens,
            },
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_body<'a>(&'a self, message: &'a str) -> GeminiRequest<'a> {
        GeminiRequest {
            system_instruction: GeminiContent {
                role: None,
                parts: vec![GeminiPart {
                    text: &self.system_prompt,
                }],
            },
            contents: vec![GeminiContent {
                role: Some("user"),
                parts: vec![GeminiPart { text: message }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: self.generation_config.temperature,
                max_output_tokens: self.generation_config.max_output_tokens,
            },
        }
    }
}

/// Extract the reply text from a successful response body
fn parse_response(body: &str) -> Result<String, AiError> {
    let response: GeminiResponse = serde_json::from_str(body)
        .map_err(|e| AiError::api(format!("Failed to parse Gemini response: {}", e)))?;

    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(AiError::blocked(reason));
    }

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(AiError::blocked("no candidates returned"));
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();

    match candidate.finish_reason.as_deref() {
        Some(reason @ ("SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT")) => {
            Err(AiError::blocked(reason))
        }
        _ if text.trim().is_empty() => Err(AiError::blocked("empty response")),
        _ => Ok(text.trim().to_string()),
    }
}

/// Translate a non-success response into the error taxonomy
fn error_from_response(status: StatusCode, body: &str) -> AiError {
    let detail = serde_json::from_str::<GeminiErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or(GeminiErrorDetail {
            message: String::new(),
            status: String::new(),
        });
    let message = if detail.message.is_empty() {
        status.canonical_reason().unwrap_or("Unknown error").to_string()
    } else {
        detail.message
    };
    let lower = message.to_lowercase();

    let kind = if status == StatusCode::TOO_MANY_REQUESTS || detail.status == "RESOURCE_EXHAUSTED" {
        ErrorKind::RateLimitError
    } else if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
        || lower.contains("api key")
    {
        return AiError::api(format!("API key rejected ({}): {}", status.as_u16(), message));
    } else {
        ErrorKind::from_status(status.as_u16())
    };

    AiError::new(
        kind,
        format!("Gemini API request failed ({}): {}", status.as_u16(), message),
    )
}

#[async_trait]
impl CompletionBackend for GeminiClient {
    async fn complete(&self, message: &str) -> Result<String, AiError> {
        crate::debug_log!("Gemini request: model={} chars={}", self.model, message.chars().count());

        let response = self
            .http_client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .header("x-goog-api-key", &self.api_key)
            .json(&self.request_body(message))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let err = error_from_response(status, &body);
            crate::warn_log!("Gemini call failed: {}", err);
            return Err(err);
        }
        parse_response(&body)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}
