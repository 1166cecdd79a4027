//! Shutdown coordination.

use std::future::Future;
use std::time::Duration;

use hyper_util::server::graceful::GracefulShutdown;
use tokio::sync::broadcast;
use tokio::task::JoinSet;

use crate::config::duration;
use crate::lifecycle::state::DrainOutcome;
use crate::net::ConnectionTracker;

/// Coordinator for programmatic shutdown.
///
/// Provides a broadcast channel that long-running tasks can subscribe to.
/// The binary reacts to OS signals instead; this is the handle embedders
/// and tests use.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// A future that completes once [`Shutdown::trigger`] is called (or every
    /// `Shutdown` handle is dropped).
    ///
    /// Subscribes immediately, so a trigger that happens after this call and
    /// before the first poll is not missed.
    pub fn signalled(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut rx = self.subscribe();
        async move {
            let _ = rx.recv().await;
        }
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Let in-flight connections finish, bounded by `timeout`.
///
/// Every connection watched by `graceful` is asked to finish its current
/// request and close. Connections still open when the timeout elapses are
/// aborted by shutting down `connections`.
pub async fn drain(
    graceful: GracefulShutdown,
    mut connections: JoinSet<()>,
    tracker: &ConnectionTracker,
    timeout: Duration,
) -> DrainOutcome {
    tracing::info!(
        in_flight = tracker.active_count(),
        timeout = %duration::format(timeout),
        "Draining connections"
    );

    let drained = {
        let connections = &mut connections;
        tokio::time::timeout(timeout, async move {
            graceful.shutdown().await;
            while connections.join_next().await.is_some() {}
        })
        .await
    };

    match drained {
        Ok(()) => {
            tracing::info!("All connections drained");
            DrainOutcome::Drained
        }
        Err(_) => {
            let remaining = tracker.active_count();
            tracing::warn!(
                remaining,
                timeout = %duration::format(timeout),
                "Shutdown timeout elapsed, aborting remaining connections"
            );
            connections.shutdown().await;
            DrainOutcome::TimedOut { remaining }
        }
    }
}
