//! Remote AI backends
//!
//! A backend performs exactly one completion attempt for a sanitized visitor
//! message and reports failures as [`AiError`]. Retries, timeouts and
//! fallbacks are layered on top by [`crate::retry`] and [`crate::service`].

mod client;
mod endpoint;
mod prompt;

pub use client::GeminiClient;
pub use endpoint::EndpointClient;
pub use prompt::build_system_prompt;

use crate::config::ConfigError;
use crate::error::AiError;
use crate::profile::ProfileContext;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// A single-attempt text completion service
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, message: &str) -> Result<String, AiError>;

    /// Short label for logs and status lines
    fn name(&self) -> &str;
}

/// Which backend answers chat turns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Call the Gemini API directly
    #[default]
    Gemini,
    /// POST to a running `/api/chat` server
    Endpoint,
}

impl std::str::FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gemini" | "google" => Ok(Provider::Gemini),
            "endpoint" | "server" => Ok(Provider::Endpoint),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: Provider,
    pub model: String,
    pub base_url: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Fallback key when the environment variable is unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Chat endpoint used by [`Provider::Endpoint`]
    pub endpoint_url: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub request_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: Provider::Gemini,
            model: "gemini-1.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            api_key: None,
            endpoint_url: "http://127.0.0.1:3000/api/chat".to_string(),
            temperature: 0.7,
            max_output_tokens: 512,
            request_timeout_secs: 30,
        }
    }
}

impl LlmConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Build the backend selected by `config.provider`.
///
/// `api_key` is only needed for [`Provider::Gemini`].
pub fn create_backend(
    config: &LlmConfig,
    api_key: Option<&str>,
    profile: &ProfileContext,
) -> Result<Arc<dyn CompletionBackend>, ConfigError> {
    match config.provider {
        Provider::Gemini => {
            let key = api_key.ok_or_else(|| ConfigError::MissingApiKey(config.api_key_env.clone()))?;
            Ok(Arc::new(GeminiClient::new(config, key, profile)?))
        }
        Provider::Endpoint => Ok(Arc::new(EndpointClient::new(config)?)),
    }
}
