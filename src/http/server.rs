//! HTTP server setup and connection serving.
//!
//! # Responsibilities
//! - Create the Axum Router with the single responder handler
//! - Wire up middleware (tracing, request ID, request timeout)
//! - Serve HTTP/1.1 and HTTP/2 connections from the listener
//! - Close connections that stall on a read or write, idle keep-alive
//!   included
//! - Stop accepting and drain on shutdown

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    extract::{ConnectInfo, State},
    http::Request,
    response::Response,
    routing::any,
    Router,
};
use hyper::body::Incoming;
use hyper_util::{
    rt::{TokioExecutor, TokioIo, TokioTimer},
    server::{conn::auto::Builder, graceful::GracefulShutdown},
    service::TowerToHyperService,
};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio_io_timeout::TimeoutStream;
use tower::ServiceExt;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{DiagnosticMode, ResponderConfig};
use crate::http::request::request_id_layer;
use crate::http::response;
use crate::lifecycle::shutdown::drain;
use crate::lifecycle::{DrainOutcome, LifecycleState};
use crate::net::{ConnectionTracker, Listener, ListenerError};
use crate::pipeline::{Pipeline, RequestView};

/// Fixed per-connection limit for receiving request headers, for handling a
/// single request, and for any read or write on the socket to make progress.
pub const CONNECTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Largest request body read for a debug dump.
pub const MAX_DUMP_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Application state injected into the handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ResponderConfig>,
    pub pipeline: Arc<Pipeline>,
}

/// HTTP server for the responder.
pub struct HttpServer {
    router: Router,
    config: Arc<ResponderConfig>,
    lifecycle: watch::Sender<LifecycleState>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ResponderConfig) -> Self {
        let config = Arc::new(config);
        let state = AppState {
            pipeline: Arc::new(Pipeline::from_config(&config)),
            config: Arc::clone(&config),
        };
        let (lifecycle, _) = watch::channel(LifecycleState::Listening);

        Self {
            router: Self::build_router(state),
            config,
            lifecycle,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn build_router(state: AppState) -> Router {
        // Targets that are not paths (`OPTIONS *`, absolute-form) land in the
        // fallback, so every request reaches the same handler.
        Router::new()
            .route("/", any(respond_to))
            .route("/{*path}", any(respond_to))
            .fallback(respond_to)
            .with_state(state)
            .layer(TimeoutLayer::new(CONNECTION_TIMEOUT))
            .layer(TraceLayer::new_for_http())
            .layer(request_id_layer())
    }

    /// Replace the router, e.g. to wrap it in extra layers.
    pub fn map_router(mut self, f: impl FnOnce(Router) -> Router) -> Self {
        self.router = f(self.router);
        self
    }

    /// A clone of the router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Observe lifecycle transitions.
    ///
    /// The server reports `Listening` from construction; it is meant to be
    /// run on an already bound [`Listener`].
    pub fn lifecycle(&self) -> watch::Receiver<LifecycleState> {
        self.lifecycle.subscribe()
    }

    /// Serve connections from `listener` until `shutdown` completes, then
    /// drain within the configured shutdown timeout.
    ///
    /// A drain that times out is not an error; it is reported through
    /// [`DrainOutcome::TimedOut`].
    pub async fn run<F>(self, listener: Listener, shutdown: F) -> Result<DrainOutcome, ListenerError>
    where
        F: Future<Output = ()> + Send,
    {
        tracing::info!(
            address = %listener.local_addr(),
            status = self.config.status.as_u16(),
            stages = ?self.config.enabled_stages(),
            "HTTP server starting"
        );

        let builder = connection_builder();
        let graceful = GracefulShutdown::new();
        let tracker = ConnectionTracker::new();
        let mut connections = JoinSet::new();
        let mut shutdown = std::pin::pin!(shutdown);

        self.lifecycle.send_replace(LifecycleState::Listening);

        let accepted = loop {
            tokio::select! {
                result = listener.accept() => match result {
                    Ok((stream, peer_addr)) => {
                        self.spawn_connection(&mut connections, &graceful, &tracker, &builder, stream, peer_addr);
                    }
                    Err(e) => break Err(e),
                },
                Some(joined) = connections.join_next(), if !connections.is_empty() => {
                    if let Err(e) = joined {
                        if e.is_panic() {
                            tracing::error!(error = %e, "Connection task panicked");
                        }
                    }
                }
                _ = shutdown.as_mut() => break Ok(()),
            }
        };

        // Closing the socket here means no connection is admitted once the
        // drain starts.
        drop(listener);

        if let Err(e) = accepted {
            tracing::error!(error = %e, "Accept loop failed");
            connections.shutdown().await;
            self.lifecycle.send_replace(LifecycleState::Stopped);
            return Err(e);
        }

        self.lifecycle.send_replace(LifecycleState::Draining);
        let outcome = drain(graceful, connections, &tracker, self.config.shutdown_timeout).await;
        self.lifecycle.send_replace(LifecycleState::Stopped);

        tracing::info!(outcome = ?outcome, "HTTP server stopped");
        Ok(outcome)
    }

    fn spawn_connection(
        &self,
        connections: &mut JoinSet<()>,
        graceful: &GracefulShutdown,
        tracker: &ConnectionTracker,
        builder: &Builder<TokioExecutor>,
        stream: TcpStream,
        peer_addr: SocketAddr,
    ) {
        let guard = tracker.track();
        let watcher = graceful.watcher();
        let builder = builder.clone();
        let service = TowerToHyperService::new(self.router.clone().map_request(
            move |mut request: Request<Incoming>| {
                request.extensions_mut().insert(ConnectInfo(peer_addr));
                request
            },
        ));

        // A read that waits longer than the timeout fails the connection,
        // which is also what closes a keep-alive connection left idle.
        let mut stream = TimeoutStream::new(stream);
        stream.set_read_timeout(Some(CONNECTION_TIMEOUT));
        stream.set_write_timeout(Some(CONNECTION_TIMEOUT));
        let io = TokioIo::new(Box::pin(stream));

        connections.spawn(async move {
            let connection = builder.serve_connection(io, service);
            if let Err(e) = watcher.watch(connection).await {
                tracing::debug!(
                    connection_id = %guard.id(),
                    peer_addr = %peer_addr,
                    error = %e,
                    "Connection ended with error"
                );
            }
            drop(guard);
        });
    }
}

fn connection_builder() -> Builder<TokioExecutor> {
    let mut builder = Builder::new(TokioExecutor::new());
    builder
        .http1()
        .timer(TokioTimer::new())
        .header_read_timeout(CONNECTION_TIMEOUT);
    builder
}

/// The responder handler: pipeline, then response and diagnostic line.
async fn respond_to(State(state): State<AppState>, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();
    let decision = state.pipeline.evaluate(&RequestView::from_parts(&parts));

    let mode = state.config.diagnostic_mode();
    let body = match mode {
        DiagnosticMode::Dump => read_body(body).await,
        DiagnosticMode::Access | DiagnosticMode::Off => Bytes::new(),
    };

    response::respond(&decision, &parts, &body, mode)
}

async fn read_body(body: Body) -> Bytes {
    match axum::body::to_bytes(body, MAX_DUMP_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read request body for dump");
            Bytes::new()
        }
    }
}
