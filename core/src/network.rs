//! Network status tracking
//!
//! Tri-state connectivity shared between the retry orchestrator (which scales
//! its budget by it) and status displays (which subscribe to changes).
//! `Offline` comes only from connectivity events; latency probes decide
//! between `Online` and `Slow`.

use crate::error::AiError;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkStatus {
    Online,
    Offline,
    Slow,
}

impl NetworkStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            NetworkStatus::Online => "online",
            NetworkStatus::Offline => "offline",
            NetworkStatus::Slow => "slow",
        }
    }

    /// Badge glyph for status lines
    pub fn icon(self) -> &'static str {
        match self {
            NetworkStatus::Online => "●",
            NetworkStatus::Slow => "◐",
            NetworkStatus::Offline => "○",
        }
    }
}

impl std::fmt::Display for NetworkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Small asset fetched to measure latency
    pub probe_url: String,
    /// Round trips slower than this mark the network slow
    pub slow_threshold_ms: u64,
    /// Minimum spacing between probes
    pub probe_interval_secs: u64,
    /// Hard limit on a single probe
    pub probe_timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            probe_url: "https://www.gstatic.com/generate_204".to_string(),
            slow_threshold_ms: 2000,
            probe_interval_secs: 30,
            probe_timeout_secs: 5,
        }
    }
}

impl NetworkConfig {
    pub fn slow_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_threshold_ms)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval_secs)
    }
}

/// One latency measurement against a remote endpoint
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    async fn ping(&self) -> Result<(), AiError>;
}

/// Probe that fetches a tiny asset over HTTP
pub struct HttpProbe {
    client: reqwest::Client,
    url: String,
}

impl HttpProbe {
    pub fn new(config: &NetworkConfig) -> Result<Self, AiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.probe_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url: config.probe_url.clone(),
        })
    }
}

#[async_trait]
impl ConnectivityProbe for HttpProbe {
    async fn ping(&self) -> Result<(), AiError> {
        // No caching: the asset must actually cross the wire
        self.client
            .head(&self.url)
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

pub struct NetworkMonitor {
    config: NetworkConfig,
    probe: Arc<dyn ConnectivityProbe>,
    status_tx: watch::Sender<NetworkStatus>,
    last_probe: Mutex<Option<Instant>>,
}

impl NetworkMonitor {
    pub fn new(config: NetworkConfig, probe: Arc<dyn ConnectivityProbe>) -> Self {
        let (status_tx, _) = watch::channel(NetworkStatus::Online);
        Self {
            config,
            probe,
            status_tx,
            last_probe: Mutex::new(None),
        }
    }

    /// Monitor backed by [`HttpProbe`]
    pub fn with_http_probe(config: NetworkConfig) -> Result<Self, AiError> {
        let probe = Arc::new(HttpProbe::new(&config)?);
        Ok(Self::new(config, probe))
    }

    pub fn status(&self) -> NetworkStatus {
        *self.status_tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<NetworkStatus> {
        self.status_tx.subscribe()
    }

    /// Connectivity event from the host. Going online clears `Offline`; the
    /// next probe decides between `Online` and `Slow`.
    pub fn set_online(&self, online: bool) {
        let next = if online {
            NetworkStatus::Online
        } else {
            NetworkStatus::Offline
        };
        let changed = self.status_tx.send_if_modified(|status| {
            // a reconnect keeps a known-slow link slow
            let next = if online && *status == NetworkStatus::Slow {
                NetworkStatus::Slow
            } else {
                next
            };
            if *status == next {
                return false;
            }
            *status = next;
            true
        });
        if changed {
            crate::info_log!("Network status changed: {}", self.status());
        }
    }

    /// Refresh the status with a latency probe, at most once per interval.
    ///
    /// Returns the cached status when offline or when throttled. A failed
    /// probe means `Slow`, never `Offline`.
    pub async fn probe(&self) -> NetworkStatus {
        if self.status() == NetworkStatus::Offline {
            return NetworkStatus::Offline;
        }

        {
            let mut last = self.last_probe.lock();
            let now = Instant::now();
            if let Some(at) = *last {
                if now.saturating_duration_since(at) < self.config.probe_interval() {
                    return self.status();
                }
            }
            *last = Some(now);
        }

        let started = Instant::now();
        let measured = match self.probe.ping().await {
            Ok(()) if started.elapsed() > self.config.slow_threshold() => NetworkStatus::Slow,
            Ok(()) => NetworkStatus::Online,
            Err(e) => {
                crate::debug_log!("Connectivity probe failed: {}", e);
                NetworkStatus::Slow
            }
        };

        // a connectivity event may have landed while the probe was in flight
        let changed = self.status_tx.send_if_modified(|status| {
            if *status == NetworkStatus::Offline || *status == measured {
                return false;
            }
            *status = measured;
            true
        });
        if changed {
            crate::info_log!("Network status changed: {}", measured);
        }
        self.status()
    }

    /// Probe on a fixed interval until the returned handle is aborted
    pub fn spawn_probe_loop(self: &Arc<Self>) -> JoinHandle<()> {
        let monitor = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(monitor.config.probe_interval());
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                monitor.probe().await;
            }
        })
    }
}
