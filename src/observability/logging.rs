//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Write the per-request access line and debug dump
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for machines, pretty format for people
//! - `RUST_LOG` overrides the configured level
//! - Access lines and dumps have their own targets, always enabled at INFO,
//!   so a quiet level or a narrow `RUST_LOG` never hides output that was
//!   switched on with `--debug` or `--access-log`

use axum::http::{request::Parts, StatusCode};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};
use crate::http::request::{dump_request, peer_addr, request_id};
use crate::http::response::status_line;

pub const ACCESS_TARGET: &str = "mock_responder::access";
pub const DUMP_TARGET: &str = "mock_responder::dump";

/// Filter used when `RUST_LOG` is not set.
pub fn default_directive(level: &str) -> String {
    format!("mock_responder={level},tower_http=warn")
}

/// Full filter: `RUST_LOG` if set, else the configured level, with the
/// diagnostic targets appended.
pub fn filter_directives(level: &str, env: Option<&str>) -> String {
    let base = match env.map(str::trim) {
        Some(env) if !env.is_empty() => env.to_string(),
        _ => default_directive(level),
    };
    format!("{base},{ACCESS_TARGET}=info,{DUMP_TARGET}=info")
}

/// Install the global subscriber. Call once, from `main`.
pub fn init_logging(config: &LoggingConfig) {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = EnvFilter::try_new(filter_directives(&config.level, env.as_deref()))
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(&config.level, None)));

    let registry = tracing_subscriber::registry().with(filter);
    match config.format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
            .init(),
    }
}

/// One compact line: status, method, path.
pub fn log_access(request: &Parts, status: StatusCode) {
    let path = request.uri.path();
    tracing::info!(
        target: ACCESS_TARGET,
        status = status.as_u16(),
        method = %request.method,
        path = %path,
        remote_addr = %peer_label(request),
        request_id = request_id(request),
        "{} {} {}",
        status.as_u16(),
        request.method,
        path
    );
}

/// The full incoming request followed by the outgoing status line.
pub fn log_dump(request: &Parts, body: &[u8], status: StatusCode) {
    tracing::info!(
        target: DUMP_TARGET,
        remote_addr = %peer_label(request),
        request_id = request_id(request),
        "{}\n{}",
        dump_request(request, body),
        status_line(request.version, status)
    );
}

fn peer_label(request: &Parts) -> String {
    peer_addr(request).map_or_else(|| "-".to_string(), |addr| addr.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::ConnectInfo;
    use axum::http::Request;
    use std::io;
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn capture(f: impl FnOnce()) -> String {
        capture_filtered("trace", f)
    }

    fn capture_filtered(directives: &str, f: impl FnOnce()) -> String {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new(directives))
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        captured.text()
    }

    fn request() -> Parts {
        Request::builder()
            .method("PUT")
            .uri("/items/7?verbose=1")
            .header("x-auth-subject", "u1")
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    #[test]
    fn access_line_has_status_method_path() {
        let out = capture(|| log_access(&request(), StatusCode::CREATED));
        assert_eq!(out.lines().count(), 1);
        assert!(out.contains("201 PUT /items/7"), "{out}");
        assert!(out.contains(ACCESS_TARGET), "{out}");
    }

    #[test]
    fn dump_has_request_and_status_line() {
        let out = capture(|| log_dump(&request(), b"payload", StatusCode::FORBIDDEN));
        assert!(out.contains("PUT /items/7?verbose=1 HTTP/1.1"), "{out}");
        assert!(out.contains("x-auth-subject: u1"), "{out}");
        assert!(out.contains("payload"), "{out}");
        assert!(out.contains("HTTP/1.1 403 Forbidden"), "{out}");
    }

    #[test]
    fn access_line_names_the_peer() {
        let mut parts = request();
        parts
            .extensions
            .insert(ConnectInfo(SocketAddr::from(([10, 0, 0, 1], 4000))));

        let out = capture(|| log_access(&parts, StatusCode::OK));
        assert!(out.contains("remote_addr=10.0.0.1:4000"), "{out}");

        let out = capture(|| log_dump(&parts, b"", StatusCode::OK));
        assert!(out.contains("remote_addr=10.0.0.1:4000"), "{out}");

        let out = capture(|| log_access(&request(), StatusCode::OK));
        assert!(out.contains("remote_addr=-"), "{out}");
    }

    #[test]
    fn diagnostics_survive_a_quiet_level() {
        let quiet = filter_directives("warn", None);
        let out = capture_filtered(&quiet, || log_access(&request(), StatusCode::OK));
        assert!(out.contains("200 PUT /items/7"), "{out}");

        let out = capture_filtered(&quiet, || log_dump(&request(), b"", StatusCode::OK));
        assert!(out.contains("HTTP/1.1 200 OK"), "{out}");

        let out = capture_filtered(&quiet, || tracing::info!("server chatter"));
        assert!(out.is_empty(), "{out}");
    }

    #[test]
    fn diagnostics_survive_a_narrow_rust_log() {
        let narrow = filter_directives("info", Some("hyper=debug"));
        assert!(narrow.starts_with("hyper=debug,"));
        let out = capture_filtered(&narrow, || log_access(&request(), StatusCode::CREATED));
        assert!(out.contains("201 PUT /items/7"), "{out}");
    }

    #[test]
    fn blank_rust_log_uses_configured_level() {
        assert_eq!(
            filter_directives("debug", Some("  ")),
            format!("mock_responder=debug,tower_http=warn,{ACCESS_TARGET}=info,{DUMP_TARGET}=info")
        );
    }

    #[test]
    fn default_directive_scopes_crate() {
        assert_eq!(default_directive("debug"), "mock_responder=debug,tower_http=warn");
        assert!(EnvFilter::try_new(default_directive("info")).is_ok());
    }
}
