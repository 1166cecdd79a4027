//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → end of the listening phase
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain connections (bounded) → Stopped
//!
//! State (state.rs):
//!     Listening → Draining → Stopped
//! ```
//!
//! # Design Decisions
//! - Ordered shutdown: stop accept, drain, close
//! - Shutdown has a timeout: stragglers are aborted after the deadline and
//!   the process still exits cleanly

pub mod shutdown;
pub mod signals;
pub mod state;

pub use shutdown::Shutdown;
pub use signals::{wait_for_termination, TerminationSignal};
pub use state::{DrainOutcome, LifecycleState};
