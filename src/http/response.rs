//! Response construction.
//!
//! # Responsibilities
//! - Turn a pipeline decision into a response
//! - Body is always the reason phrase of the final status
//! - Hand the exchange to the diagnostic log
//!
//! # Design Decisions
//! - The body is set even for statuses that forbid one (204, 304); hyper
//!   drops it on the wire, the same way other HTTP engines do
//! - Logging happens after the response is built and never changes it

use axum::http::{request::Parts, StatusCode, Version};
use axum::response::{IntoResponse, Response};

use crate::config::DiagnosticMode;
use crate::observability::logging;
use crate::pipeline::PipelineDecision;

/// Standard reason phrase for `status`, empty for unregistered codes.
pub fn reason_phrase(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("")
}

/// `HTTP/1.1 200 OK` style status line.
pub fn status_line(version: Version, status: StatusCode) -> String {
    format!("{:?} {} {}", version, status.as_u16(), reason_phrase(status))
        .trim_end()
        .to_string()
}

/// Build the response for a decision.
pub fn build_response(decision: &PipelineDecision) -> Response {
    let mut response = (decision.status, reason_phrase(decision.status)).into_response();
    let headers = response.headers_mut();
    for (name, value) in &decision.propagated_headers {
        headers.append(name.clone(), value.clone());
    }
    response
}

/// Build the response and write the configured diagnostic line.
///
/// `body` is only read for [`DiagnosticMode::Dump`].
pub fn respond(
    decision: &PipelineDecision,
    request: &Parts,
    body: &[u8],
    mode: DiagnosticMode,
) -> Response {
    let response = build_response(decision);
    match mode {
        DiagnosticMode::Dump => logging::log_dump(request, body, response.status()),
        DiagnosticMode::Access => logging::log_access(request, response.status()),
        DiagnosticMode::Off => {}
    }
    response
}
