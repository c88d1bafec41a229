//! HTTP chat endpoint
//!
//! - POST /api/chat   - one visitor message in, one reply out
//! - GET  /api/health - liveness and configuration check
//!
//! The endpoint makes a single model call per request. Retries, rate
//! limiting and template fallbacks belong to the client-side session.

mod handlers;

use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use folio_core::config::{Config, ConfigError};
use folio_core::llm::{CompletionBackend, GeminiClient};
use folio_core::Profile;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    /// `None` when no API key is configured; chat requests then fail fast
    pub backend: Option<Arc<dyn CompletionBackend>>,
    pub model: String,
    /// Name of the variable the key is read from, for error messages
    pub api_key_env: String,
}

impl AppState {
    /// Build the Gemini backend from config. A missing key is not fatal.
    pub fn from_config(config: &Config, profile: &Profile) -> Result<Self> {
        let backend: Option<Arc<dyn CompletionBackend>> = match config.api_key() {
            Ok(key) => {
                let client = GeminiClient::new(&config.ai, &key, &profile.context())
                    .context("Failed to create Gemini client")?;
                Some(Arc::new(client))
            }
            Err(ConfigError::MissingApiKey(var)) => {
                folio_core::warn_log!("{} is not set, /api/chat will return 500", var);
                None
            }
            Err(e) => return Err(e).context("Invalid API key configuration"),
        };

        Ok(Self {
            backend,
            model: config.ai.model.clone(),
            api_key_env: config.ai.api_key_env.clone(),
        })
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    if origins.is_empty() {
        return cors.allow_origin(Any);
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                folio_core::warn_log!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(allowed))
}

pub fn create_router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/api/chat", post(handlers::chat_handler))
        .route("/api/health", get(handlers::health_handler))
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP server until ctrl-c
pub async fn run(config: &Config, profile: &Profile) -> Result<()> {
    let state = AppState::from_config(config, profile)?;
    let configured = state.backend.is_some();
    let app = create_router(state, &config.server.cors_origins);

    let addr = config.server.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    println!("folio listening on http://{}", addr);
    println!("Model:   {}", config.ai.model);
    if configured {
        println!("API key: configured");
    } else {
        println!("API key: MISSING (set {})", config.ai.api_key_env);
    }
    folio_core::info_log!("Server started on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    folio_core::info_log!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        folio_core::error_log!("Failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
}
