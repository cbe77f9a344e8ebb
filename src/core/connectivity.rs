//! Reachability signal.
//!
//! A single shared flag, `true` until the first observation says otherwise.
//! Readers take a point-in-time snapshot; the probe task is the only writer
//! in normal operation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use url::Url;

/// Default TCP connect timeout for a probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Shared reachability flag.
#[derive(Debug, Clone)]
pub struct ConnectivityMonitor {
    connected: Arc<AtomicBool>,
}

impl ConnectivityMonitor {
    /// A monitor that reports connected until told otherwise.
    #[must_use]
    pub fn new() -> Self {
        Self::with_state(true)
    }

    #[must_use]
    pub fn with_state(connected: bool) -> Self {
        Self {
            connected: Arc::new(AtomicBool::new(connected)),
        }
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Record an observation. Returns the previous value.
    pub fn set_connected(&self, connected: bool) -> bool {
        self.connected.swap(connected, Ordering::AcqRel)
    }

    /// Probe `addr` once and record the outcome.
    pub async fn probe_once(&self, addr: &str, timeout: Duration) -> bool {
        let connected = check_connection(addr, timeout).await;
        let previous = self.set_connected(connected);
        if previous != connected {
            tracing::info!(addr, connected, "connectivity changed");
        }
        connected
    }

    /// Probe `addr` every `interval` until the returned handle is aborted.
    ///
    /// Transitions are logged, along with how long an outage lasted once the
    /// connection is restored.
    #[must_use]
    pub fn spawn_probe(&self, addr: String, interval: Duration, timeout: Duration) -> JoinHandle<()> {
        let monitor = self.clone();
        tokio::spawn(async move {
            let mut down_since: Option<Instant> = None;
            loop {
                let connected = check_connection(&addr, timeout).await;
                let was_connected = monitor.set_connected(connected);

                if was_connected && !connected {
                    tracing::warn!(addr = %addr, "connection lost");
                    down_since = Some(Instant::now());
                } else if !was_connected && connected {
                    match down_since.take() {
                        Some(start) => tracing::info!(
                            addr = %addr,
                            down_for = ?start.elapsed(),
                            "connection restored"
                        ),
                        None => tracing::info!(addr = %addr, "connection restored"),
                    }
                }

                tokio::time::sleep(interval).await;
            }
        })
    }
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new()
    }
}

/// `host:port` to probe for a base URL, using the scheme's default port.
#[must_use]
pub fn probe_address(base_url: &str) -> Option<String> {
    let url = Url::parse(base_url.trim()).ok()?;
    let host = url.host_str()?;
    let port = url.port_or_known_default()?;
    if host.contains(':') && !host.starts_with('[') {
        Some(format!("[{host}]:{port}"))
    } else {
        Some(format!("{host}:{port}"))
    }
}

async fn check_connection(addr: &str, timeout: Duration) -> bool {
    matches!(
        tokio::time::timeout(timeout, TcpStream::connect(addr)).await,
        Ok(Ok(_))
    )
}
