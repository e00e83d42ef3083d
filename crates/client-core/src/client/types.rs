//! Type definitions shared by the session controller and its users

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle of a session.
///
/// ```text
/// Idle ──connect──▶ Connecting ──offer──▶ Running
///   │                   │                    │
///   │ capture failure   │ termination        │ termination
///   ▼                   ▼                    ▼
/// Disconnected ◀──disconnected event── Disconnecting
/// ```
///
/// `Disconnected` is terminal; a controller is never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    Idle,
    Connecting,
    Running,
    Disconnecting,
    Disconnected,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        self == SessionState::Disconnected
    }

    /// Whether a termination request should trigger an engine disconnect
    pub fn accepts_termination(self) -> bool {
        matches!(self, SessionState::Connecting | SessionState::Running)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Connecting => "connecting",
            SessionState::Running => "running",
            SessionState::Disconnecting => "disconnecting",
            SessionState::Disconnected => "disconnected",
        };
        f.write_str(name)
    }
}

/// Where a termination request came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationSource {
    /// SIGINT / Ctrl-C
    Interrupt,
    /// SIGTERM
    Terminate,
    /// The embedding application asked for it
    Application,
}

impl fmt::Display for TerminationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TerminationSource::Interrupt => "interrupt",
            TerminationSource::Terminate => "terminate",
            TerminationSource::Application => "application",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_state() {
        assert!(SessionState::Disconnected.is_terminal());
        assert!(!SessionState::Disconnecting.is_terminal());
    }

    #[test]
    fn test_termination_acceptance() {
        assert!(SessionState::Connecting.accepts_termination());
        assert!(SessionState::Running.accepts_termination());
        assert!(!SessionState::Idle.accepts_termination());
        assert!(!SessionState::Disconnecting.accepts_termination());
        assert!(!SessionState::Disconnected.accepts_termination());
    }
}
