//! Component wiring shared by the CLI commands

use crate::cli::BackendArgs;
use anyhow::{Context, Result};
use folio_core::config::Config;
use folio_core::llm::{create_backend, CompletionBackend, Provider};
use folio_core::{AiResponseService, NetworkMonitor, Profile, RateLimiter};
use std::path::Path;
use std::sync::Arc;

pub struct App {
    pub config: Config,
    pub profile: Arc<Profile>,
}

impl App {
    /// Load config and profile. `profile` overrides `profile_path`.
    pub fn load(config_path: Option<&Path>, profile: Option<&Path>) -> Result<Self> {
        let mut config = Config::load_or_default(config_path).context("Failed to load config")?;
        if let Some(path) = profile {
            config.profile_path = Some(path.to_path_buf());
        }
        let profile = config.load_profile().context("Failed to load profile")?;
        Ok(Self {
            config,
            profile: Arc::new(profile),
        })
    }

    /// Backend for chat turns, with CLI overrides applied
    pub fn backend(&self, args: &BackendArgs) -> Result<Arc<dyn CompletionBackend>> {
        let mut ai = self.config.ai.clone();
        if let Some(provider) = args.provider {
            ai.provider = provider;
        }
        if let Some(url) = &args.endpoint {
            ai.endpoint_url = url.clone();
            if args.provider.is_none() {
                ai.provider = Provider::Endpoint;
            }
        }

        let key = match ai.provider {
            Provider::Gemini => Some(self.config.api_key().with_context(|| {
                format!(
                    "No usable Gemini API key. Set {} or run with --provider endpoint",
                    ai.api_key_env
                )
            })?),
            Provider::Endpoint => None,
        };

        create_backend(&ai, key.as_deref(), &self.profile.context())
            .context("Failed to create AI backend")
    }

    /// Response service with its own limiter and network monitor
    pub fn service(&self, backend: Arc<dyn CompletionBackend>) -> Result<Arc<AiResponseService>> {
        let limiter = Arc::new(RateLimiter::new(self.config.rate_limit.clone()));
        let network = Arc::new(
            NetworkMonitor::with_http_probe(self.config.network.clone())
                .context("Failed to create network probe")?,
        );
        folio_core::debug_log!("Using backend {}", backend.name());

        Ok(Arc::new(AiResponseService::new(
            backend,
            self.profile.clone(),
            limiter,
            network,
            self.config.retry.clone(),
            self.config.chat.max_user_retries,
        )))
    }
}
