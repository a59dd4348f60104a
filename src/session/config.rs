use serde::{Deserialize, Serialize};

/// Configuration for a conversation session
///
/// A session is created from the room-name/credential/server triple handed
/// out by the room service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Unique session identifier (e.g., "session-6f1c...")
    pub session_id: String,

    /// Room to join
    pub room_name: String,

    /// Media server URL (ws:// or wss://)
    pub server_url: String,

    /// Access token for the room
    pub token: String,
}

impl SessionConfig {
    pub fn for_room(
        room_name: impl Into<String>,
        server_url: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            room_name: room_name.into(),
            server_url: server_url.into(),
            token: token.into(),
            ..Self::default()
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_id: format!("session-{}", uuid::Uuid::new_v4()),
            room_name: "practice".to_string(),
            server_url: "ws://localhost:7880".to_string(),
            token: String::new(),
        }
    }
}
