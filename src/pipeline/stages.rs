//! Individual pipeline stages.

use axum::http::{HeaderMap, HeaderName, HeaderValue};

use crate::pipeline::RequestView;

/// Header whose presence satisfies the auth-subject check.
pub const AUTH_SUBJECT_HEADER: &str = "x-auth-subject";

/// Prefix of propagated authentication headers, in canonical lowercase form.
pub const AUTH_HEADER_PREFIX: &str = "x-auth-";

/// Why a request was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// No `X-Auth-Subject` header.
    MissingAuthSubject,
    /// Method not on the allow-list.
    MethodNotAllowed,
}

impl Rejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rejection::MissingAuthSubject => "missing X-Auth-Subject header",
            Rejection::MethodNotAllowed => "request method not allowed",
        }
    }
}

/// Result of running one stage.
#[derive(Debug, PartialEq, Eq)]
pub enum StageOutcome {
    Continue,
    Reject(Rejection),
}

/// One step of the request pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    /// Reject unless `X-Auth-Subject` is present.
    RequireAuthSubject,
    /// Reject unless the method matches one of these exactly.
    RestrictMethods(Vec<String>),
    /// Copy `Authorization` and `X-Auth-*` headers to the response.
    CopyAuthHeaders,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::RequireAuthSubject => "check-auth-subject",
            Stage::RestrictMethods(_) => "check-request-method",
            Stage::CopyAuthHeaders => "copy-auth-header",
        }
    }

    /// Run the stage, appending any headers to propagate onto `propagated`.
    pub fn apply(
        &self,
        request: &RequestView<'_>,
        propagated: &mut Vec<(HeaderName, HeaderValue)>,
    ) -> StageOutcome {
        match self {
            Stage::RequireAuthSubject => {
                if request.headers.contains_key(AUTH_SUBJECT_HEADER) {
                    StageOutcome::Continue
                } else {
                    StageOutcome::Reject(Rejection::MissingAuthSubject)
                }
            }
            Stage::RestrictMethods(allowed) => {
                if allowed.iter().any(|m| m == request.method) {
                    StageOutcome::Continue
                } else {
                    StageOutcome::Reject(Rejection::MethodNotAllowed)
                }
            }
            Stage::CopyAuthHeaders => {
                collect_auth_headers(request.headers, propagated);
                StageOutcome::Continue
            }
        }
    }
}

/// Whether a header is forwarded by [`Stage::CopyAuthHeaders`].
///
/// Header names arrive lowercased from the HTTP engine, so the canonical
/// `X-Auth-` and `Authorization` spellings are compared in lowercase.
pub fn is_auth_header(name: &HeaderName) -> bool {
    let name = name.as_str();
    name == "authorization" || name.starts_with(AUTH_HEADER_PREFIX)
}

fn collect_auth_headers(headers: &HeaderMap, out: &mut Vec<(HeaderName, HeaderValue)>) {
    for name in headers.keys().filter(|name| is_auth_header(name)) {
        for value in headers.get_all(name) {
            out.push((name.clone(), value.clone()));
        }
    }
}
