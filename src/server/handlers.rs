//! Request handlers for the chat endpoint

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use folio_core::validation::{validate, ValidationError};
use folio_core::{AiError, ErrorKind};
use serde::Deserialize;
use serde_json::{json, Value};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    message: Value,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body = json!({ "error": message.into(), "success": false });
    (status, Json(body)).into_response()
}

/// Map a failed model call to a status and a message for the caller
fn failure_response(err: &AiError) -> Response {
    if err.blocked {
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Response was blocked by content filters. Please rephrase your question.",
        );
    }
    match err.kind {
        ErrorKind::RateLimitError => error_response(
            StatusCode::TOO_MANY_REQUESTS,
            "Rate limit exceeded. Please try again in a moment.",
        ),
        ErrorKind::InvalidInput => error_response(StatusCode::BAD_REQUEST, err.message.clone()),
        _ if err.message.to_lowercase().contains("api key") => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Server configuration error: the API key was rejected.",
        ),
        _ => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to generate a response. Please try again.",
        ),
    }
}

pub async fn chat_handler(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let Some(backend) = state.backend.as_ref() else {
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Server configuration error: {} is not set", state.api_key_env),
        );
    };

    let message = match body {
        Ok(Json(ChatRequest {
            message: Value::String(message),
        })) => message,
        Ok(_) | Err(_) => {
            return error_response(StatusCode::BAD_REQUEST, ValidationError::NotText.to_string())
        }
    };

    let sanitized = match validate(&message) {
        Ok(sanitized) => sanitized,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };

    match backend.complete(&sanitized).await {
        Ok(text) => Json(json!({ "response": text, "success": true })).into_response(),
        Err(e) => {
            folio_core::error_log!("Chat request failed: {}", e);
            failure_response(&e)
        }
    }
}

pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "model": state.model,
        "api_key_configured": state.backend.is_some(),
    }))
}

#[cfg(test)]
mod tests {
    use super::super::{create_router, AppState};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use folio_core::llm::CompletionBackend;
    use folio_core::{AiError, ErrorKind};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tower::ServiceExt;

    struct FixedBackend {
        result: Result<String, AiError>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CompletionBackend for FixedBackend {
        async fn complete(&self, _message: &str) -> Result<String, AiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn state_with(result: Option<Result<String, AiError>>) -> (AppState, Option<Arc<FixedBackend>>) {
        let backend = result.map(|result| {
            Arc::new(FixedBackend {
                result,
                calls: AtomicUsize::new(0),
            })
        });
        let state = AppState {
            backend: backend
                .clone()
                .map(|b| b as Arc<dyn CompletionBackend>),
            model: "gemini-1.5-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
        };
        (state, backend)
    }

    async fn post_chat(state: AppState, body: &str) -> (StatusCode, Value) {
        let app = create_router(state, &[]);
        let request = Request::builder()
            .method("POST")
            .uri("/api/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_chat_success() {
        let (state, backend) = state_with(Some(Ok("I build web apps in Rust.".to_string())));
        let (status, body) = post_chat(state, r#"{"message":"What do you build?"}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"], "I build web apps in Rust.");
        assert_eq!(body["success"], true);
        assert_eq!(backend.unwrap().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let (state, _) = state_with(None);
        let (status, body) = post_chat(state, r#"{"message":"Hello"}"#).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert_eq!(
            body["error"],
            "Server configuration error: GEMINI_API_KEY is not set"
        );
    }

    #[tokio::test]
    async fn test_bad_bodies() {
        for body in [r#"{}"#, r#"{"message":42}"#, "not json"] {
            let (state, backend) = state_with(Some(Ok("unused".to_string())));
            let (status, json) = post_chat(state, body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body: {}", body);
            assert_eq!(json["success"], false);
            assert_eq!(json["error"], "Message is required and must be a string.");
            assert_eq!(backend.unwrap().calls.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn test_unsafe_message_rejected() {
        let (state, backend) = state_with(Some(Ok("unused".to_string())));
        let (status, body) =
            post_chat(state, r#"{"message":"<script>alert(1)</script>"}"#).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Message contains content that isn't allowed.");
        assert_eq!(backend.unwrap().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failure_statuses() {
        let cases = [
            (
                AiError::new(ErrorKind::RateLimitError, "quota exceeded"),
                StatusCode::TOO_MANY_REQUESTS,
                "Rate limit",
            ),
            (
                AiError::blocked("SAFETY"),
                StatusCode::INTERNAL_SERVER_ERROR,
                "blocked by content filters",
            ),
            (
                AiError::api("API key rejected (403): permission denied"),
                StatusCode::INTERNAL_SERVER_ERROR,
                "Server configuration error",
            ),
            (
                AiError::new(ErrorKind::ServiceUnavailable, "overloaded"),
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to generate",
            ),
        ];

        for (err, expected_status, fragment) in cases {
            let (state, _) = state_with(Some(Err(err)));
            let (status, body) = post_chat(state, r#"{"message":"Tell me about Ledgerline"}"#).await;
            assert_eq!(status, expected_status);
            let message = body["error"].as_str().unwrap();
            assert!(message.contains(fragment), "{} missing {}", message, fragment);
        }
    }

    #[tokio::test]
    async fn test_health() {
        let (state, _) = state_with(None);
        let app = create_router(state, &["https://jordanellis.dev".to_string()]);
        let request = Request::builder()
            .uri("/api/health")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["model"], "gemini-1.5-flash");
        assert_eq!(body["api_key_configured"], false);
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let (state, _) = state_with(None);
        let app = create_router(state, &[]);
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/api/chat")
            .header(header::ORIGIN, "https://example.com")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
    }
}
