use std::fmt;

/// Lifecycle of one node as tracked by the harness.
///
/// ```text
/// Configured --create/start--> Running <--start-- Stopped
///                               |   \                ^
///                      disconnect    `----stop-------|
///                               v                    |
///                          Disconnected ----stop-----'
/// any --remove--> Removed --start--> Running (fresh container)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeState {
    /// Built from a seed table row, no container yet
    Configured,
    /// Process executing and attached to the shared network
    Running,
    /// Container exists but is not executing
    Stopped,
    /// Process executing but isolated from the shared network
    Disconnected,
    /// Container released. Name and seeds remain, so `start` builds a new
    /// container on a new port
    Removed,
}

impl NodeState {
    /// Whether the node owns a container that may still be executing
    pub fn is_executing(&self) -> bool {
        matches!(self, NodeState::Running | NodeState::Disconnected)
    }

    pub fn can_disconnect(&self) -> bool {
        matches!(self, NodeState::Running)
    }
}

impl fmt::Display for NodeState {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let state = match self {
            NodeState::Configured => "configured",
            NodeState::Running => "running",
            NodeState::Stopped => "stopped",
            NodeState::Disconnected => "disconnected",
            NodeState::Removed => "removed",
        };
        f.write_str(state)
    }
}
