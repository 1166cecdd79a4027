//! Configuration validation.
//!
//! Serde and clap handle syntax; this module checks the values make sense
//! together. Validation is a pure function that reports every problem at
//! once rather than stopping at the first.

use std::str::FromStr;

use axum::http::Method;
use tracing::level_filters::LevelFilter;

use crate::config::schema::ResponderConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("listen address {0:?} must be `host:port` or `:port`")]
    ListenAddress(String),
    #[error("status {0} is informational and cannot be a final response")]
    InformationalStatus(u16),
    #[error("allowed method {0:?} is not a valid HTTP method token")]
    Method(String),
    #[error("log level {0:?} is not one of trace, debug, info, warn, error, off")]
    LogLevel(String),
}

/// Check a configuration, returning all validation errors found.
pub fn validate_config(config: &ResponderConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if !is_valid_listen_address(&config.listen_address) {
        errors.push(ValidationError::ListenAddress(config.listen_address.clone()));
    }

    if config.status.is_informational() {
        errors.push(ValidationError::InformationalStatus(config.status.as_u16()));
    }

    for method in &config.allowed_methods {
        if method.is_empty() || Method::from_bytes(method.as_bytes()).is_err() {
            errors.push(ValidationError::Method(method.clone()));
        }
    }

    if LevelFilter::from_str(&config.logging.level).is_err() {
        errors.push(ValidationError::LogLevel(config.logging.level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_valid_listen_address(address: &str) -> bool {
    let Some((host, port)) = address.rsplit_once(':') else {
        return false;
    };
    if port.parse::<u16>().is_err() {
        return false;
    }
    // An unbracketed colon in the host means a bare IPv6 literal.
    !(host.contains(':') && !(host.starts_with('[') && host.ends_with(']')))
}
