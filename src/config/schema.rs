//! Configuration schema definitions.
//!
//! All types derive Serde traits so the same structure can be read from a
//! TOML file and then overridden from the command line.

use std::time::Duration;

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

/// Methods accepted by the method allow-list when none are configured.
pub const DEFAULT_ALLOWED_METHODS: [&str; 8] = [
    "DELETE", "GET", "HEAD", "OPTIONS", "PATCH", "POST", "PUT", "TRACE",
];

/// Root configuration for the responder.
///
/// Built once at startup and shared read-only with every request.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ResponderConfig {
    /// Bind address: `host:port`, or `:port` for all interfaces.
    pub listen_address: String,

    /// Status returned to every request that passes the pipeline.
    #[serde(with = "status_code")]
    pub status: StatusCode,

    /// How long in-flight connections may take to finish after a
    /// termination signal.
    #[serde(with = "crate::config::duration::serde")]
    pub shutdown_timeout: Duration,

    /// Dump every request and the outgoing status line.
    pub debug: bool,

    /// Emit one compact line per request.
    pub access_log: bool,

    /// Copy `Authorization` and `X-Auth-*` headers onto the response.
    pub copy_auth_header: bool,

    /// Reject requests without an `X-Auth-Subject` header.
    pub check_auth_subject: bool,

    /// Reject requests whose method is not in `allowed_methods`.
    pub check_request_method: bool,

    /// Methods accepted when `check_request_method` is on.
    pub allowed_methods: Vec<String>,

    /// Log output settings.
    pub logging: LoggingConfig,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            listen_address: ":8080".to_string(),
            status: StatusCode::OK,
            shutdown_timeout: Duration::from_secs(5),
            debug: false,
            access_log: false,
            copy_auth_header: false,
            check_auth_subject: false,
            check_request_method: false,
            allowed_methods: DEFAULT_ALLOWED_METHODS.iter().map(|m| m.to_string()).collect(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ResponderConfig {
    /// Addresses handed to the socket layer, tried in order. A bare `:port`
    /// binds every interface: the IPv6 wildcard (which also accepts IPv4 on
    /// dual-stack hosts) first, then the IPv4 wildcard.
    pub fn bind_addresses(&self) -> Vec<String> {
        if self.listen_address.starts_with(':') {
            vec![
                format!("[::]{}", self.listen_address),
                format!("0.0.0.0{}", self.listen_address),
            ]
        } else {
            vec![self.listen_address.clone()]
        }
    }

    /// Which per-request diagnostic line is written, if any.
    pub fn diagnostic_mode(&self) -> DiagnosticMode {
        if self.debug {
            DiagnosticMode::Dump
        } else if self.access_log {
            DiagnosticMode::Access
        } else {
            DiagnosticMode::Off
        }
    }

    /// Names of the pipeline stages that are switched on, in execution order.
    pub fn enabled_stages(&self) -> Vec<&'static str> {
        let mut stages = Vec::new();
        if self.check_auth_subject {
            stages.push("check-auth-subject");
        }
        if self.check_request_method {
            stages.push("check-request-method");
        }
        if self.copy_auth_header {
            stages.push("copy-auth-header");
        }
        stages
    }
}

/// Per-request diagnostic output. Debug dumps take precedence over the
/// access log when both are enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticMode {
    Off,
    Access,
    Dump,
}

/// Log output configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level when `RUST_LOG` is not set (trace, debug, info, warn, error, off).
    pub level: String,

    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable, one event per line.
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Serde adapter storing a [`StatusCode`] as its numeric value.
mod status_code {
    use axum::http::StatusCode;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &StatusCode, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(value.as_u16())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<StatusCode, D::Error> {
        let code = u16::deserialize(deserializer)?;
        StatusCode::from_u16(code).map_err(serde::de::Error::custom)
    }
}
