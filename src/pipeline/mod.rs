//! Request pipeline.
//!
//! # Data Flow
//! ```text
//! RequestView (method, path, headers)
//!     → check-auth-subject   (reject 403 without X-Auth-Subject)
//!     → check-request-method (reject 403 outside the allow-list)
//!     → copy-auth-header     (collect Authorization / X-Auth-* values)
//!     → PipelineDecision
//! ```
//!
//! # Design Decisions
//! - Pure function of (request, config); no state survives a request
//! - First rejecting stage wins and nothing is propagated on rejection
//! - Checks run before propagation so rejected requests never echo
//!   credentials

pub mod stages;

use axum::http::{request::Parts, HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};

use crate::config::ResponderConfig;

pub use stages::{Rejection, Stage, StageOutcome};

/// Read-only view of the parts of a request the pipeline looks at.
#[derive(Debug, Clone, Copy)]
pub struct RequestView<'a> {
    pub method: &'a str,
    pub path: &'a str,
    pub headers: &'a HeaderMap,
}

impl<'a> RequestView<'a> {
    pub fn new(method: &'a Method, uri: &'a Uri, headers: &'a HeaderMap) -> Self {
        Self {
            method: method.as_str(),
            path: uri.path(),
            headers,
        }
    }

    pub fn from_parts(parts: &'a Parts) -> Self {
        Self::new(&parts.method, &parts.uri, &parts.headers)
    }
}

/// Outcome of running the pipeline over one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineDecision {
    /// Status to answer with.
    pub status: StatusCode,
    /// Headers to set on the response, in order.
    pub propagated_headers: Vec<(HeaderName, HeaderValue)>,
    /// True when a check rejected the request.
    pub short_circuited: bool,
    /// Which check rejected the request, if any.
    pub rejection: Option<Rejection>,
}

impl PipelineDecision {
    fn rejected(rejection: Rejection) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            propagated_headers: Vec::new(),
            short_circuited: true,
            rejection: Some(rejection),
        }
    }
}

/// The ordered set of stages enabled by a configuration.
#[derive(Debug, Clone)]
pub struct Pipeline {
    stages: Vec<Stage>,
    status: StatusCode,
}

impl Pipeline {
    pub fn from_config(config: &ResponderConfig) -> Self {
        let mut stages = Vec::with_capacity(3);
        if config.check_auth_subject {
            stages.push(Stage::RequireAuthSubject);
        }
        if config.check_request_method {
            stages.push(Stage::RestrictMethods(config.allowed_methods.clone()));
        }
        if config.copy_auth_header {
            stages.push(Stage::CopyAuthHeaders);
        }
        Self {
            stages,
            status: config.status,
        }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn evaluate(&self, request: &RequestView<'_>) -> PipelineDecision {
        let mut propagated = Vec::new();
        for stage in &self.stages {
            if let StageOutcome::Reject(rejection) = stage.apply(request, &mut propagated) {
                tracing::debug!(
                    stage = stage.name(),
                    method = request.method,
                    path = request.path,
                    reason = rejection.as_str(),
                    "Request rejected"
                );
                return PipelineDecision::rejected(rejection);
            }
        }

        PipelineDecision {
            status: self.status,
            propagated_headers: propagated,
            short_circuited: false,
            rejection: None,
        }
    }
}

/// Evaluate `request` against `config` in one call.
///
/// The server builds its [`Pipeline`] once at startup; this is the
/// equivalent for callers that only hold a configuration.
pub fn evaluate(request: &RequestView<'_>, config: &ResponderConfig) -> PipelineDecision {
    Pipeline::from_config(config).evaluate(request)
}
