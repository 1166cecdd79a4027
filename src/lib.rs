//! Configurable mock HTTP responder library.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod pipeline;

pub use config::schema::ResponderConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
