//! Mock HTTP responder.
//!
//! Answers every request with one configured status and its reason phrase.
//! Optional stages reject requests missing an auth subject or using a
//! disallowed method, and can copy auth headers back onto the response.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ net::Listener ─▶ http::server ─▶ pipeline ─▶ http::response
//!                                                                      │
//!     Client Response ◀────────────────────────────────────────────────┘
//!
//!     config (flags + TOML)   observability (tracing)   lifecycle (signals, drain)
//! ```

use std::process::ExitCode;

use clap::Parser;

use mock_responder::config::{loader::resolve_config, duration, Cli};
use mock_responder::http::HttpServer;
use mock_responder::lifecycle::{wait_for_termination, DrainOutcome};
use mock_responder::net::Listener;
use mock_responder::observability::logging::init_logging;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logging is not up yet, so configuration errors go straight to stderr.
    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("mock-responder: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config.logging);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        listen_address = %config.listen_address,
        status = config.status.as_u16(),
        shutdown_timeout = %duration::format(config.shutdown_timeout),
        stages = ?config.enabled_stages(),
        "mock-responder starting"
    );

    let listener = match Listener::bind_any(&config.bind_addresses()).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start listener");
            return ExitCode::FAILURE;
        }
    };

    let server = HttpServer::new(config);
    let shutdown = async {
        wait_for_termination().await;
    };

    match server.run(listener, shutdown).await {
        Ok(DrainOutcome::Drained) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Ok(DrainOutcome::TimedOut { remaining }) => {
            tracing::info!(aborted = remaining, "Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Server failed");
            ExitCode::FAILURE
        }
    }
}
