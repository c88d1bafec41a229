//! Host connectivity watcher
//!
//! Polls the network interfaces with sysinfo and reports online/offline
//! transitions to the [`NetworkMonitor`]. Latency is the monitor's own
//! business; this only answers "is there a link at all".

use folio_core::NetworkMonitor;
use std::sync::Arc;
use std::time::Duration;
use sysinfo::Networks;
use tokio::task::JoinHandle;

const POLL_INTERVAL: Duration = Duration::from_secs(5);

fn is_loopback(name: &str) -> bool {
    let name = name.to_lowercase();
    name == "lo" || name.starts_with("lo0") || name.contains("loopback")
}

/// True when some non-loopback interface has carried traffic
fn has_active_interface<'a>(interfaces: impl IntoIterator<Item = (&'a str, u64)>) -> bool {
    interfaces
        .into_iter()
        .any(|(name, total_bytes)| !is_loopback(name) && total_bytes > 0)
}

fn host_is_online() -> bool {
    let networks = Networks::new_with_refreshed_list();
    has_active_interface(
        (&networks)
            .into_iter()
            .map(|(name, data)| (name.as_str(), data.total_received() + data.total_transmitted())),
    )
}

/// Watch interfaces until the handle is aborted
pub fn spawn_watcher(monitor: Arc<NetworkMonitor>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(POLL_INTERVAL);
        loop {
            ticker.tick().await;
            // a failed poll says nothing about the link
            let online = tokio::task::spawn_blocking(host_is_online)
                .await
                .unwrap_or(true);
            monitor.set_online(online);
        }
    })
}
