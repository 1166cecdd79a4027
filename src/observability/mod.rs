//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Server events (bind, drain, errors)   → tracing events
//! Per-request spans                     → tower-http TraceLayer
//! Per-request diagnostic line           → logging.rs (access line or dump)
//!     → stdout, pretty or JSON
//! ```
//!
//! # Design Decisions
//! - Structured logging only; there is no metrics endpoint
//! - Request ID flows into the access line and dump

pub mod logging;
