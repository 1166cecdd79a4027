//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop)
//!     → connection.rs (id + open-connection count)
//!     → Hand off to the HTTP layer
//! ```
//!
//! # Design Decisions
//! - Per-connection accept failures never stop the server
//! - Every connection is counted so a drain can report leftovers

pub mod connection;
pub mod listener;

pub use connection::{ConnectionGuard, ConnectionId, ConnectionTracker};
pub use listener::{Listener, ListenerError};
