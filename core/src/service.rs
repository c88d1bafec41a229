//! AI response service
//!
//! The single entry point for turning a visitor message into a reply. Runs
//! the cheap local checks first (network, validation, rate limit), then the
//! retrying remote call, and degrades to a template reply instead of leaving
//! the visitor without an answer.

use crate::error::{AiError, ErrorKind};
use crate::llm::CompletionBackend;
use crate::network::{NetworkMonitor, NetworkStatus};
use crate::profile::Profile;
use crate::rate_limiter::RateLimiter;
use crate::retry::{RetryConfig, RetryOrchestrator};
use crate::template::TemplateResponder;
use crate::validation::validate;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// A failed turn as shown to the visitor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiFailure {
    pub kind: ErrorKind,
    /// Friendly text, never a raw kind name
    pub message: String,
    /// Whether offering "try again" makes sense
    pub retryable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseOutcome {
    Answered { text: String, fallback_used: bool },
    Failed(AiFailure),
}

#[derive(Debug, Clone)]
pub struct AiResponse {
    pub outcome: ResponseOutcome,
    pub response_time: Duration,
}

impl AiResponse {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ResponseOutcome::Answered { .. })
    }

    pub fn text(&self) -> Option<&str> {
        match &self.outcome {
            ResponseOutcome::Answered { text, .. } => Some(text),
            ResponseOutcome::Failed(_) => None,
        }
    }

    pub fn fallback_used(&self) -> bool {
        matches!(
            self.outcome,
            ResponseOutcome::Answered {
                fallback_used: true,
                ..
            }
        )
    }

    pub fn failure(&self) -> Option<&AiFailure> {
        match &self.outcome {
            ResponseOutcome::Failed(failure) => Some(failure),
            ResponseOutcome::Answered { .. } => None,
        }
    }
}

fn failed(kind: ErrorKind, message: impl Into<String>, retryable: bool) -> ResponseOutcome {
    ResponseOutcome::Failed(AiFailure {
        kind,
        message: message.into(),
        retryable,
    })
}

pub struct AiResponseService {
    backend: Arc<dyn CompletionBackend>,
    orchestrator: RetryOrchestrator,
    limiter: Arc<RateLimiter>,
    network: Arc<NetworkMonitor>,
    templates: TemplateResponder,
    contact_email: String,
    max_user_retries: u32,
}

impl AiResponseService {
    pub fn new(
        backend: Arc<dyn CompletionBackend>,
        profile: Arc<Profile>,
        limiter: Arc<RateLimiter>,
        network: Arc<NetworkMonitor>,
        retry: RetryConfig,
        max_user_retries: u32,
    ) -> Self {
        Self {
            backend,
            orchestrator: RetryOrchestrator::new(retry, limiter.clone(), network.clone()),
            limiter,
            network,
            contact_email: profile.contact.email.clone(),
            templates: TemplateResponder::new(profile),
            max_user_retries,
        }
    }

    pub fn network(&self) -> &Arc<NetworkMonitor> {
        &self.network
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn max_user_retries(&self) -> u32 {
        self.max_user_retries
    }

    /// Produce a reply for `message`.
    ///
    /// `retry_count` is how many times the visitor has already pressed retry
    /// for this message; it decides between a retryable error and a template
    /// fallback once remote attempts are exhausted. Never panics.
    pub async fn generate_response(&self, message: &str, retry_count: u32) -> AiResponse {
        let started = Instant::now();

        let outcome = match AssertUnwindSafe(self.respond(message, retry_count))
            .catch_unwind()
            .await
        {
            Ok(outcome) => outcome,
            Err(_) => {
                crate::error_log!("Response pipeline panicked, answering from templates");
                self.fallback_or_contact(|| self.templates.respond(message))
            }
        };

        let response = AiResponse {
            outcome,
            response_time: started.elapsed(),
        };
        crate::debug_log!(
            "Turn finished in {:?}: success={} fallback={}",
            response.response_time,
            response.is_success(),
            response.fallback_used()
        );
        response
    }

    async fn respond(&self, message: &str, retry_count: u32) -> ResponseOutcome {
        if self.network.status() == NetworkStatus::Offline {
            return failed(
                ErrorKind::NetworkError,
                ErrorKind::NetworkError.user_message(),
                true,
            );
        }

        let sanitized = match validate(message) {
            Ok(sanitized) => sanitized,
            Err(e) => return failed(ErrorKind::InvalidInput, e.to_string(), false),
        };
        // sanitizing can change the text, so check what will actually be sent
        let sanitized = match validate(&sanitized) {
            Ok(sanitized) => sanitized,
            Err(e) => return failed(ErrorKind::InvalidInput, e.to_string(), false),
        };

        if !self.limiter.can_make_request() {
            let wait = self.limiter.time_until_reset();
            let secs = wait.as_millis().div_ceil(1000).max(1);
            crate::info_log!("Rate limited locally, {}s until reset", secs);
            return failed(
                ErrorKind::RateLimitError,
                format!(
                    "You're sending messages a little fast. Please wait {} seconds and try again.",
                    secs
                ),
                true,
            );
        }

        match self
            .orchestrator
            .run(|| self.backend.complete(&sanitized))
            .await
        {
            Ok(text) => ResponseOutcome::Answered {
                text,
                fallback_used: false,
            },
            Err(err) => self.handle_exhausted(err, &sanitized, retry_count),
        }
    }

    fn handle_exhausted(&self, err: AiError, sanitized: &str, retry_count: u32) -> ResponseOutcome {
        crate::warn_log!(
            "{} failed: {} (retry_count={})",
            self.backend.name(),
            err,
            retry_count
        );

        if err.kind.is_transient() && retry_count < self.max_user_retries {
            let message = if err.blocked {
                "I can't answer that one as asked. Could you rephrase your question?"
            } else {
                err.kind.user_message()
            };
            return failed(err.kind, message, true);
        }

        self.fallback_or_contact(|| self.templates.respond(sanitized))
    }

    /// Template reply, or a fixed contact message if rendering panics too
    fn fallback_or_contact<F: FnOnce() -> String>(&self, render: F) -> ResponseOutcome {
        match std::panic::catch_unwind(AssertUnwindSafe(render)) {
            Ok(text) => ResponseOutcome::Answered {
                text,
                fallback_used: true,
            },
            Err(_) => {
                crate::error_log!("Template fallback panicked");
                failed(
                    ErrorKind::ServiceUnavailable,
                    format!(
                        "I'm having trouble responding right now. Please try again, or email me \
                         directly at {}.",
                        self.contact_email
                    ),
                    true,
                )
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::llm::mock::ScriptedBackend;
    use crate::network::tests::StubProbe;
    use crate::network::NetworkConfig;

    pub(crate) struct Fixture {
        pub service: Arc<AiResponseService>,
        pub backend: Arc<ScriptedBackend>,
        pub network: Arc<NetworkMonitor>,
    }

    pub(crate) fn fixture(backend: ScriptedBackend) -> Fixture {
        let backend = Arc::new(backend);
        let probe = Arc::new(StubProbe::new(Duration::from_millis(10), false));
        let network = Arc::new(NetworkMonitor::new(NetworkConfig::default(), probe));
        let service = Arc::new(AiResponseService::new(
            backend.clone(),
            Arc::new(Profile::builtin().unwrap()),
            Arc::new(RateLimiter::default()),
            network.clone(),
            RetryConfig::default(),
            3,
        ));
        Fixture {
            service,
            backend,
            network,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_success() {
        let f = fixture(ScriptedBackend::replying("I love Rust!"));
        let response = f.service.generate_response("Do you like Rust?", 0).await;
        assert_eq!(response.text(), Some("I love Rust!"));
        assert!(!response.fallback_used());
        assert_eq!(f.service.limiter().status().requests_in_window, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_offline_short_circuits() {
        let f = fixture(ScriptedBackend::replying("unused"));
        f.network.set_online(false);
        let response = f.service.generate_response("Hello there", 0).await;

        let failure = response.failure().unwrap();
        assert_eq!(failure.kind, ErrorKind::NetworkError);
        assert!(failure.retryable);
        assert_eq!(f.backend.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_input_not_retryable() {
        let f = fixture(ScriptedBackend::replying("unused"));
        let response = f.service.generate_response("<script>alert(1)</script>", 0).await;

        let failure = response.failure().unwrap();
        assert_eq!(failure.kind, ErrorKind::InvalidInput);
        assert!(!failure.retryable);
        assert_eq!(f.backend.calls(), 0);
        assert_eq!(f.service.limiter().status().requests_in_window, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sanitized_text_rejected_without_using_the_limiter() {
        // passes as typed, but stripping the tag leaves a run of twelve
        let f = fixture(ScriptedBackend::replying("unused"));
        let response = f.service.generate_response("aaaaaa<i>aaaaaa", 0).await;

        let failure = response.failure().unwrap();
        assert_eq!(failure.kind, ErrorKind::InvalidInput);
        assert!(!failure.retryable);
        assert_eq!(f.backend.calls(), 0);
        assert_eq!(f.service.limiter().status().requests_in_window, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_eleventh_request_rate_limited() {
        let f = fixture(ScriptedBackend::replying("Sure!"));
        for i in 0..10 {
            let response = f.service.generate_response(&format!("Question {}", i), 0).await;
            assert!(response.is_success());
        }

        let response = f.service.generate_response("One more question", 0).await;
        let failure = response.failure().unwrap();
        assert_eq!(failure.kind, ErrorKind::RateLimitError);
        assert!(failure.retryable);
        assert!(failure.message.contains("wait 60 seconds"));
        assert_eq!(f.backend.calls(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failure_is_retryable_while_retries_remain() {
        let f = fixture(ScriptedBackend::failing(AiError::network("connection reset")));
        let response = f.service.generate_response("What are your skills?", 0).await;

        let failure = response.failure().unwrap();
        assert_eq!(failure.kind, ErrorKind::NetworkError);
        assert!(failure.retryable);
        assert_eq!(failure.message, ErrorKind::NetworkError.user_message());
        assert_eq!(f.backend.calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fallback_when_retries_exhausted() {
        let f = fixture(ScriptedBackend::failing(AiError::network("connection reset")));
        let response = f.service.generate_response("What are your skills?", 3).await;

        assert!(response.fallback_used());
        let expected = TemplateResponder::new(Arc::new(Profile::builtin().unwrap()))
            .respond("What are your skills?");
        assert_eq!(response.text(), Some(expected.as_str()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_provider_rate_limit_falls_back_immediately() {
        let f = fixture(ScriptedBackend::failing(AiError::new(
            ErrorKind::RateLimitError,
            "quota exceeded",
        )));
        let response = f.service.generate_response("Where are you based?", 0).await;
        assert!(response.fallback_used());
        assert_eq!(f.backend.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient_failure() {
        let f = fixture(
            ScriptedBackend::replying("Hi!").then(vec![Err(AiError::new(
                ErrorKind::ServiceUnavailable,
                "overloaded",
            ))]),
        );
        let response = f.service.generate_response("Hello", 0).await;
        assert_eq!(response.text(), Some("Hi!"));
        assert_eq!(f.backend.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panic_answered_from_templates() {
        let f = fixture(ScriptedBackend::panicking());
        let response = f.service.generate_response("How can I contact you?", 0).await;
        assert!(response.fallback_used());
        assert!(response.text().unwrap().contains("jordan.ellis@example.com"));
    }

    #[test]
    fn test_contact_message_when_templates_panic() {
        let f = fixture(ScriptedBackend::replying("unused"));
        let outcome = f.service.fallback_or_contact(|| panic!("template failure"));
        match outcome {
            ResponseOutcome::Failed(failure) => {
                assert_eq!(failure.kind, ErrorKind::ServiceUnavailable);
                assert!(failure.retryable);
                assert!(failure.message.contains("jordan.ellis@example.com"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }
}
