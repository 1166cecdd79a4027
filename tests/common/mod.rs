//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{extract::Request, middleware::Next, Router};
use mock_responder::config::ResponderConfig;
use mock_responder::http::HttpServer;
use mock_responder::lifecycle::{DrainOutcome, LifecycleState, Shutdown};
use mock_responder::net::{Listener, ListenerError};
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;

/// A responder running on an ephemeral loopback port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    #[allow(dead_code)]
    pub lifecycle: watch::Receiver<LifecycleState>,
    handle: JoinHandle<Result<DrainOutcome, ListenerError>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Trigger shutdown and wait for the drain to finish.
    pub async fn stop(self) -> DrainOutcome {
        self.shutdown.trigger();
        self.handle
            .await
            .expect("server task panicked")
            .expect("server failed")
    }
}

pub async fn start_server(config: ResponderConfig) -> TestServer {
    start_with(HttpServer::new(config)).await
}

pub async fn start_with(server: HttpServer) -> TestServer {
    let listener = Listener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr();
    let shutdown = Shutdown::new();
    let lifecycle = server.lifecycle();
    let handle = tokio::spawn(server.run(listener, shutdown.signalled()));

    TestServer {
        addr,
        shutdown,
        lifecycle,
        handle,
    }
}

/// Client that never goes through an environment proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}

/// Wrap the router so each request waits `delay` before being answered.
/// `entered` is notified as soon as a request reaches the delay.
#[allow(dead_code)]
pub fn slow_router(entered: Arc<Notify>, delay: Duration) -> impl FnOnce(Router) -> Router {
    move |router| {
        router.layer(axum::middleware::from_fn(move |request: Request, next: Next| {
            let entered = entered.clone();
            async move {
                entered.notify_one();
                tokio::time::sleep(delay).await;
                next.run(request).await
            }
        }))
    }
}
