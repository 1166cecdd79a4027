//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (hyper connection, Axum router, middleware)
//!     → request.rs (request ID, dump rendering)
//!     → pipeline (stages decide status and propagated headers)
//!     → response.rs (reason phrase body, diagnostic line)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::HttpServer;
