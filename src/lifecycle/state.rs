//! Server lifecycle states.

/// Where the server is in its lifetime.
///
/// Transitions only move forward: `Listening → Draining → Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LifecycleState {
    /// Bound and accepting connections.
    Listening,
    /// A termination signal arrived; no new connections, in-flight ones
    /// are finishing.
    Draining,
    /// Every connection is closed, either drained or aborted.
    Stopped,
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LifecycleState::Listening => "listening",
            LifecycleState::Draining => "draining",
            LifecycleState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// How the drain phase ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// All in-flight connections finished within the timeout.
    Drained,
    /// The timeout elapsed and `remaining` connections were aborted.
    TimedOut { remaining: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn states_are_ordered() {
        assert!(LifecycleState::Listening < LifecycleState::Draining);
        assert!(LifecycleState::Draining < LifecycleState::Stopped);
        assert_eq!(LifecycleState::Draining.to_string(), "draining");
    }
}
