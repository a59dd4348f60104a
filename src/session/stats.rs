use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::state::ConnectionStatus;

/// Point-in-time view of a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStatus {
    pub session_id: String,

    pub room_name: String,

    pub state: ConnectionStatus,

    /// Whole seconds spent connected
    pub duration_secs: u64,

    /// Duration formatted as MM:SS
    pub timer_text: String,

    /// Reason of the last connection failure, if any
    pub last_error: Option<String>,

    /// When the session was created
    pub created_at: DateTime<Utc>,

    /// When the connection was established
    pub connected_at: Option<DateTime<Utc>>,

    /// Registered event listeners (room + per-track)
    pub listener_count: usize,
}

/// Format elapsed seconds as zero-padded `MM:SS`
///
/// Minutes are not wrapped into hours, so long sessions read e.g. `"125:07"`.
pub fn format_timer(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
