//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! command line flags (cli.rs)
//!     → optional TOML base file (loader.rs)
//!     → flags overlaid on the base
//!     → validation.rs (semantic checks)
//!     → ResponderConfig (validated, immutable)
//!     → shared via Arc with every request
//! ```
//!
//! # Design Decisions
//! - Config is immutable once built; no reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde/clap) from semantic checks

pub mod cli;
pub mod duration;
pub mod loader;
pub mod schema;
pub mod validation;

pub use cli::Cli;
pub use loader::ConfigError;
pub use schema::{DiagnosticMode, LogFormat, LoggingConfig, ResponderConfig};
