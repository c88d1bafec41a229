//! Client for a running `/api/chat` server, the way the embedded widget
//! talks to it. The server holds the API key and the system prompt.

use super::{CompletionBackend, LlmConfig};
use crate::config::ConfigError;
use crate::error::{AiError, ErrorKind};
use crate::util::sanitize_base_url;
use async_trait::async_trait;
use reqwest::{Client as HttpClient, StatusCode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    success: bool,
}

pub struct EndpointClient {
    http_client: HttpClient,
    url: String,
}

impl EndpointClient {
    pub fn new(config: &LlmConfig) -> Result<Self, ConfigError> {
        let url = sanitize_base_url(&config.endpoint_url, "endpoint_url")?;
        let http_client = HttpClient::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ConfigError::InvalidUrl {
                field: "endpoint_url",
                reason: e.to_string(),
            })?;
        Ok(Self { http_client, url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Map a reply from the chat endpoint onto the error taxonomy
fn interpret(status: StatusCode, body: &str) -> Result<String, AiError> {
    let reply: Option<ChatReply> = serde_json::from_str(body).ok();

    if status.is_success() {
        return match reply {
            Some(ChatReply {
                response: Some(text),
                success: true,
                ..
            }) if !text.trim().is_empty() => Ok(text),
            Some(_) => Err(AiError::blocked("empty response")),
            None => Err(AiError::api("Malformed response from chat endpoint")),
        };
    }

    let message = reply
        .and_then(|r| r.error)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string());

    if message.to_lowercase().contains("blocked") {
        return Err(AiError::blocked(message));
    }
    let kind = match status.as_u16() {
        429 => ErrorKind::RateLimitError,
        400 => ErrorKind::InvalidInput,
        500..=599 => match ErrorKind::classify_message(&message) {
            ErrorKind::ApiError => ErrorKind::ServiceUnavailable,
            specific => specific,
        },
        other => ErrorKind::from_status(other),
    };
    Err(AiError::new(kind, message))
}

#[async_trait]
impl CompletionBackend for EndpointClient {
    async fn complete(&self, message: &str) -> Result<String, AiError> {
        let response = self
            .http_client
            .post(&self.url)
            .json(&ChatRequest { message })
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        interpret(status, &body)
    }

    fn name(&self) -> &str {
        "endpoint"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success() {
        let body = r#"{"response":"Hi, I'm Jordan!","success":true}"#;
        assert_eq!(interpret(StatusCode::OK, body).unwrap(), "Hi, I'm Jordan!");
    }

    #[test]
    fn test_malformed_success() {
        assert!(interpret(StatusCode::OK, "oops").is_err());
        assert!(interpret(StatusCode::OK, r#"{"response":"","success":true}"#)
            .unwrap_err()
            .blocked);
    }

    #[test]
    fn test_status_mapping() {
        let err = interpret(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":"Too many requests","success":false}"#,
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::RateLimitError);

        let err = interpret(
            StatusCode::BAD_REQUEST,
            r#"{"error":"Message is required","success":false}"#,
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInput);

        let err = interpret(StatusCode::INTERNAL_SERVER_ERROR, "").unwrap_err();
        assert_eq!(err.kind, ErrorKind::ServiceUnavailable);

        let err = interpret(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"error":"Response was blocked by content filters","success":false}"#,
        )
        .unwrap_err();
        assert!(err.blocked);
    }

    #[test]
    fn test_rejects_bad_url() {
        let config = LlmConfig {
            endpoint_url: "ftp://example.com".to_string(),
            ..Default::default()
        };
        assert!(EndpointClient::new(&config).is_err());
    }
}
