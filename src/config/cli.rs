//! Command line flags.

use std::path::PathBuf;
use std::time::Duration;

use axum::http::StatusCode;
use clap::Parser;

use crate::config::duration;
use crate::config::schema::{LogFormat, ResponderConfig};

#[derive(Debug, Parser)]
#[command(name = "mock-responder", version)]
#[command(about = "Answer every HTTP request with a fixed status", long_about = None)]
pub struct Cli {
    /// Bind address, `host:port` or `:port` [default: :8080]
    #[arg(long)]
    pub listen: Option<String>,

    /// Port number; replaces the port of the listen address
    #[arg(long)]
    pub port: Option<u16>,

    /// HTTP status returned to accepted requests [default: 200]
    #[arg(long, value_parser = parse_status)]
    pub status: Option<StatusCode>,

    /// Shutdown drain timeout, e.g. `5s` or `500ms` [default: 5s]
    #[arg(long, value_parser = parse_timeout)]
    pub timeout: Option<Duration>,

    /// Log every request in full
    #[arg(long)]
    pub debug: bool,

    /// Log one line per request
    #[arg(long)]
    pub access_log: bool,

    /// Copy `Authorization` and `X-Auth-*` headers onto the response
    #[arg(long)]
    pub copy_auth_header: bool,

    /// Reject requests without an `X-Auth-Subject` header
    #[arg(long)]
    pub check_auth_subject: bool,

    /// Reject requests whose method is not allowed
    #[arg(long)]
    pub check_request_method: bool,

    /// Comma separated method allow-list used by --check-request-method
    #[arg(long, value_delimiter = ',')]
    pub allowed_methods: Option<Vec<String>>,

    /// TOML file with base settings; flags take precedence
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log output format [default: pretty]
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,

    /// Log level used when RUST_LOG is unset [default: info]
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Cli {
    /// Overlay the flags that were given onto `config`.
    ///
    /// Switches only ever turn a stage on; a stage enabled by the config file
    /// stays enabled.
    pub fn apply(&self, config: &mut ResponderConfig) {
        if let Some(listen) = &self.listen {
            config.listen_address = listen.clone();
        }
        if let Some(port) = self.port {
            config.listen_address = replace_port(&config.listen_address, port);
        }
        if let Some(status) = self.status {
            config.status = status;
        }
        if let Some(timeout) = self.timeout {
            config.shutdown_timeout = timeout;
        }
        config.debug |= self.debug;
        config.access_log |= self.access_log;
        config.copy_auth_header |= self.copy_auth_header;
        config.check_auth_subject |= self.check_auth_subject;
        config.check_request_method |= self.check_request_method;
        if let Some(methods) = &self.allowed_methods {
            config.allowed_methods = methods
                .iter()
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .collect();
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
    }
}

fn replace_port(address: &str, port: u16) -> String {
    match address.rsplit_once(':') {
        Some((host, _)) => format!("{host}:{port}"),
        None => format!(":{port}"),
    }
}

fn parse_status(raw: &str) -> Result<StatusCode, String> {
    let code: u16 = raw.parse().map_err(|e| format!("{e}"))?;
    StatusCode::from_u16(code).map_err(|e| e.to_string())
}

fn parse_timeout(raw: &str) -> Result<Duration, String> {
    duration::parse(raw).map_err(|e| e.to_string())
}
