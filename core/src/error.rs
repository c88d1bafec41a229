//! Structured error types for folio
//!
//! A closed taxonomy of failure kinds shared by the remote AI client, the
//! retry orchestrator and the response service. Provider failures are
//! translated into [`ErrorKind`] at the client boundary, so nothing
//! downstream re-parses free text.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Failure classes for a chat turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Connection refused, DNS failure, or the client is offline
    NetworkError,
    /// Provider rejected or mangled the request (default class)
    ApiError,
    /// No response inside the request timeout
    TimeoutError,
    /// Local limiter refused the request or the provider returned 429
    RateLimitError,
    /// Message failed validation
    InvalidInput,
    /// Provider reported an outage (5xx)
    ServiceUnavailable,
}

impl ErrorKind {
    /// Whether re-attempting the same call has a reasonable chance of success.
    ///
    /// Rate limits and invalid input are never retried: retrying them burns
    /// quota or repeats a validation failure.
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            Self::NetworkError | Self::TimeoutError | Self::ServiceUnavailable | Self::ApiError
        )
    }

    /// Friendly text shown in the chat error banner
    pub fn user_message(self) -> &'static str {
        match self {
            Self::NetworkError => {
                "I can't reach the network right now. Check your connection and try again."
            }
            Self::TimeoutError => "That took longer than expected. Please try again.",
            Self::RateLimitError => {
                "I'm getting a lot of questions right now. Please wait a moment and try again."
            }
            Self::InvalidInput => "I couldn't process that message. Could you rephrase it?",
            Self::ServiceUnavailable => {
                "My AI service is temporarily unavailable. Please try again shortly."
            }
            Self::ApiError => "Something went wrong while generating a reply. Please try again.",
        }
    }

    /// Wire name, e.g. `NETWORK_ERROR`
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NetworkError => "NETWORK_ERROR",
            Self::ApiError => "API_ERROR",
            Self::TimeoutError => "TIMEOUT_ERROR",
            Self::RateLimitError => "RATE_LIMIT_ERROR",
            Self::InvalidInput => "INVALID_INPUT",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
        }
    }

    /// Classify free-form error text from an upstream library or server.
    ///
    /// Only used where a status code or transport error is unavailable.
    pub fn classify_message(message: &str) -> Self {
        let msg = message.to_lowercase();

        if msg.contains("rate limit") {
            Self::RateLimitError
        } else if msg.contains("api key") || msg.contains("quota") {
            Self::ApiError
        } else if msg.contains("service unavailable")
            || msg.contains("server error")
            || msg.contains("overloaded")
        {
            Self::ServiceUnavailable
        } else if msg.contains("timeout") || msg.contains("timed out") {
            Self::TimeoutError
        } else if msg.contains("network") || msg.contains("fetch") || msg.contains("connection") {
            Self::NetworkError
        } else {
            Self::ApiError
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error raised by a single remote AI attempt
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct AiError {
    pub kind: ErrorKind,
    pub message: String,
    /// Provider withheld the response (safety filters)
    pub blocked: bool,
}

impl AiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            blocked: false,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NetworkError, message)
    }

    pub fn offline() -> Self {
        Self::network("network is offline")
    }

    pub fn timeout(after: Duration) -> Self {
        Self::new(
            ErrorKind::TimeoutError,
            format!("request timed out after {}ms", after.as_millis()),
        )
    }

    pub fn api(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ApiError, message)
    }

    /// Empty or safety-blocked completion
    pub fn blocked(reason: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::ApiError,
            message: format!("response blocked: {}", reason.into()),
            blocked: true,
        }
    }

    /// Build from free text via [`ErrorKind::classify_message`]
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(ErrorKind::classify_message(&message), message)
    }
}

impl From<reqwest::Error> for AiError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            ErrorKind::TimeoutError
        } else if err.is_connect() || err.is_request() {
            ErrorKind::NetworkError
        } else if err.is_decode() || err.is_body() {
            ErrorKind::ApiError
        } else if let Some(status) = err.status() {
            ErrorKind::from_status(status.as_u16())
        } else {
            ErrorKind::classify_message(&err.to_string())
        };
        Self::new(kind, err.to_string())
    }
}

impl ErrorKind {
    /// Map an HTTP status from the provider or the chat endpoint
    pub fn from_status(status: u16) -> Self {
        match status {
            400 | 413 | 422 => Self::InvalidInput,
            408 | 504 => Self::TimeoutError,
            429 => Self::RateLimitError,
            500..=599 => Self::ServiceUnavailable,
            _ => Self::ApiError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_kinds() {
        assert!(ErrorKind::NetworkError.is_transient());
        assert!(ErrorKind::TimeoutError.is_transient());
        assert!(ErrorKind::ServiceUnavailable.is_transient());
        assert!(ErrorKind::ApiError.is_transient());
        assert!(!ErrorKind::RateLimitError.is_transient());
        assert!(!ErrorKind::InvalidInput.is_transient());
    }

    #[test]
    fn test_classify_message() {
        assert_eq!(
            ErrorKind::classify_message("Rate limit exceeded for model"),
            ErrorKind::RateLimitError
        );
        // quota text without a 429 is an account problem, not a throttle
        assert_eq!(
            ErrorKind::classify_message("Quota exhausted"),
            ErrorKind::ApiError
        );
        assert_eq!(
            ErrorKind::classify_message("Rate limit hit, quota resets hourly"),
            ErrorKind::RateLimitError
        );
        assert_eq!(
            ErrorKind::classify_message("API key not valid"),
            ErrorKind::ApiError
        );
        assert_eq!(
            ErrorKind::classify_message("503 Service Unavailable"),
            ErrorKind::ServiceUnavailable
        );
        assert_eq!(
            ErrorKind::classify_message("operation timed out"),
            ErrorKind::TimeoutError
        );
        assert_eq!(
            ErrorKind::classify_message("Failed to fetch"),
            ErrorKind::NetworkError
        );
        assert_eq!(ErrorKind::classify_message("weird"), ErrorKind::ApiError);
    }

    #[test]
    fn test_from_status() {
        assert_eq!(ErrorKind::from_status(429), ErrorKind::RateLimitError);
        assert_eq!(ErrorKind::from_status(503), ErrorKind::ServiceUnavailable);
        assert_eq!(ErrorKind::from_status(400), ErrorKind::InvalidInput);
        assert_eq!(ErrorKind::from_status(401), ErrorKind::ApiError);
    }

    #[test]
    fn test_wire_names() {
        let json = serde_json::to_string(&ErrorKind::RateLimitError).unwrap();
        assert_eq!(json, "\"RATE_LIMIT_ERROR\"");
        assert_eq!(ErrorKind::ServiceUnavailable.to_string(), "SERVICE_UNAVAILABLE");
    }

    #[test]
    fn test_user_messages_hide_kind_names() {
        for kind in [
            ErrorKind::NetworkError,
            ErrorKind::ApiError,
            ErrorKind::TimeoutError,
            ErrorKind::RateLimitError,
            ErrorKind::InvalidInput,
            ErrorKind::ServiceUnavailable,
        ] {
            assert!(!kind.user_message().contains(kind.as_str()));
        }
    }

    #[test]
    fn test_blocked_error() {
        let err = AiError::blocked("SAFETY");
        assert!(err.blocked);
        assert_eq!(err.kind, ErrorKind::ApiError);
        assert!(err.message.contains("SAFETY"));
    }
}
