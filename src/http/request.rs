//! Request identification and dumping.
//!
//! # Responsibilities
//! - Attach a request ID (UUID v4) to every request that lacks one
//! - Expose the peer address recorded by the server
//! - Render a request as text for debug logging

use std::fmt::Write;
use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::request::Parts;
use tower_http::request_id::{MakeRequestUuid, SetRequestIdLayer};

pub const X_REQUEST_ID: &str = "x-request-id";

/// Layer that sets `x-request-id` on requests that arrive without one.
pub fn request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::x_request_id(MakeRequestUuid)
}

/// The request's ID, or `-` when none was set.
pub fn request_id(parts: &Parts) -> &str {
    parts
        .headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
}

/// Address of the client that sent the request, when served from a socket.
pub fn peer_addr(parts: &Parts) -> Option<SocketAddr> {
    parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr)
}

/// Render the request line, every header and the body.
///
/// Non UTF-8 bytes in header values and the body are replaced rather than
/// dropped so the dump always shows the full message shape.
pub fn dump_request(parts: &Parts, body: &[u8]) -> String {
    let target = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    let mut dump = String::with_capacity(256 + body.len());
    let _ = writeln!(dump, "{} {} {:?}", parts.method, target, parts.version);
    for (name, value) in &parts.headers {
        let _ = writeln!(dump, "{}: {}", name, String::from_utf8_lossy(value.as_bytes()));
    }
    dump.push('\n');
    dump.push_str(&String::from_utf8_lossy(body));
    dump
}
