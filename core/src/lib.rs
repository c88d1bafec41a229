pub mod config;
pub mod error;
pub mod llm;
pub mod logger;
pub mod network;
pub mod profile;
pub mod rate_limiter;
pub mod retry;
pub mod service;
pub mod session;
pub mod template;
pub mod topics;
pub mod util;
pub mod validation;

// Re-exports for convenience
pub use config::Config;
pub use error::{AiError, ErrorKind};
pub use network::{NetworkMonitor, NetworkStatus};
pub use profile::{Profile, ProfileContext};
pub use rate_limiter::RateLimiter;
pub use service::{AiResponse, AiResponseService, ResponseOutcome};
pub use session::ChatSession;
