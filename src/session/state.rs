use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a conversation session
///
/// `Idle → Connecting → Connected → (Error | Disconnected)`. `Error` and
/// `Disconnected` are terminal for a session instance; a retry needs a fresh
/// session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Idle,
    Connecting,
    Connected,
    Error,
    Disconnected,
}

impl ConnectionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionStatus::Idle => "idle",
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Error => "error",
            ConnectionStatus::Disconnected => "disconnected",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ConnectionStatus::Error | ConnectionStatus::Disconnected)
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutable part of the session, guarded by the controller
#[derive(Debug)]
pub(crate) struct SessionState {
    pub status: ConnectionStatus,
    pub last_error: Option<String>,
    pub connected_at: Option<DateTime<Utc>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            status: ConnectionStatus::Idle,
            last_error: None,
            connected_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!ConnectionStatus::Idle.is_terminal());
        assert!(!ConnectionStatus::Connecting.is_terminal());
        assert!(!ConnectionStatus::Connected.is_terminal());
        assert!(ConnectionStatus::Error.is_terminal());
        assert!(ConnectionStatus::Disconnected.is_terminal());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&ConnectionStatus::Disconnected).unwrap();
        assert_eq!(json, "\"disconnected\"");
    }
}
