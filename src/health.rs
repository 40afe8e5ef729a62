//! Connection health monitor.
//!
//! A background task probes the inference server immediately and then on a
//! fixed interval, publishing [`ConnectionState`] through a
//! [`tokio::sync::watch`] channel. Each probe overwrites the previous value;
//! there is no history and no backoff.
//!
//! ```text
//!  Unknown ──probe ok──▶ Connected ◀──probe ok──┐
//!     │                      │                  │
//!     └──probe err──▶ Disconnected ─────────────┘
//! ```
//!
//! The task is owned by [`HealthMonitor`]: [`HealthMonitor::shutdown`] stops
//! it and waits for it, dropping the monitor aborts it. A probe in flight is
//! abandoned on shutdown, so a server that never answers cannot hold up
//! teardown.

use crate::inference::InferenceClient;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info, warn};

/// Last known reachability of the inference server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// No probe has completed yet.
    #[default]
    Unknown,
    Connected,
    Disconnected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConnectionState::Unknown => "unknown",
            ConnectionState::Connected => "connected",
            ConnectionState::Disconnected => "disconnected",
        })
    }
}

#[derive(Debug)]
struct Shared {
    client: InferenceClient,
    tx: watch::Sender<ConnectionState>,
    /// Probes in flight, scheduled and manual.
    checking: AtomicUsize,
}

/// Counts one in-flight probe; released on drop, including cancellation.
struct Checking<'a>(&'a AtomicUsize);

impl<'a> Checking<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for Checking<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Shared {
    async fn probe_and_publish(&self) -> ConnectionState {
        let checking = Checking::enter(&self.checking);
        let state = match self.client.probe().await {
            Ok(()) => ConnectionState::Connected,
            Err(e) => {
                debug!("Health probe failed: {}", e);
                ConnectionState::Disconnected
            }
        };
        drop(checking);
        let previous = self.tx.send_replace(state);

        if previous != state {
            match state {
                ConnectionState::Connected => {
                    info!("Inference server at {} is reachable", self.client.base_url())
                }
                _ => warn!("Inference server at {} is unreachable", self.client.base_url()),
            }
        }
        state
    }
}

/// Cloneable trigger for a manual probe, published like a scheduled one.
#[derive(Debug, Clone)]
pub struct ProbeHandle {
    shared: Arc<Shared>,
}

impl ProbeHandle {
    pub async fn recheck(&self) -> ConnectionState {
        self.shared.probe_and_publish().await
    }
}

/// Shortest accepted probe interval; `tokio::time::interval` rejects zero.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Handle to the background probing task.
#[derive(Debug)]
pub struct HealthMonitor {
    shared: Arc<Shared>,
    rx: watch::Receiver<ConnectionState>,
    interval: Duration,
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl HealthMonitor {
    /// Start probing `client` every `interval` (at least [`MIN_INTERVAL`]).
    /// Must be called inside a Tokio runtime.
    pub fn spawn(client: InferenceClient, interval: Duration) -> Self {
        let interval = interval.max(MIN_INTERVAL);
        let (tx, rx) = watch::channel(ConnectionState::Unknown);
        let shared = Arc::new(Shared {
            client,
            tx,
            checking: AtomicUsize::new(0),
        });
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let task_shared = Arc::clone(&shared);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    // The first tick completes immediately.
                    _ = ticker.tick() => {}
                }
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = task_shared.probe_and_publish() => {}
                }
            }
            debug!("Health monitor stopped");
        });

        debug!(
            "Health monitor started for {} every {:?}",
            shared.client.base_url(),
            interval
        );

        Self {
            shared,
            rx,
            interval,
            stop: Some(stop_tx),
            task: Some(task),
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.rx.borrow()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// A receiver that observes every published state.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.rx.clone()
    }

    /// Stream of states: the current one first, then each change.
    pub fn updates(&self) -> WatchStream<ConnectionState> {
        WatchStream::new(self.rx.clone())
    }

    /// True while any probe, scheduled or manual, is in flight.
    pub fn is_checking(&self) -> bool {
        self.shared.checking.load(Ordering::SeqCst) > 0
    }

    /// Wait for the first completed probe and return its result.
    ///
    /// Returns immediately once any probe has been published.
    pub async fn settled(&self) -> ConnectionState {
        let mut rx = self.rx.clone();
        let settled = rx
            .wait_for(|s| *s != ConnectionState::Unknown)
            .await
            .map(|state| *state);
        settled.unwrap_or_else(|_| self.state())
    }

    /// Probe now, publish and return the result.
    pub async fn recheck(&self) -> ConnectionState {
        self.shared.probe_and_publish().await
    }

    /// A detached handle that can trigger [`HealthMonitor::recheck`].
    pub fn probe_handle(&self) -> ProbeHandle {
        ProbeHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Stop the task and wait for it to finish.
    pub async fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    warn!("Health monitor task ended abnormally: {}", e);
                }
            }
        }
    }
}

impl Drop for HealthMonitor {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
