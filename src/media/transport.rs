use anyhow::Result;
use std::sync::Arc;
use tokio::sync::broadcast;

use super::events::{RoomEvent, TrackEvent};
use super::frames::VideoFrameSource;

/// Media transport trait
///
/// Abstracts a live audio/video room connection. Implementations:
/// - Loopback: in-process room for local runs and tests
///
/// Event receivers only observe events sent after they were created, so a
/// listener obtained after `connect` never sees anything from before it.
#[async_trait::async_trait]
pub trait MediaTransport: Send + Sync {
    /// Join the room at `server_url` using `token`
    async fn connect(&self, server_url: &str, token: &str) -> Result<()>;

    /// Leave the room and release media resources
    async fn disconnect(&self) -> Result<()>;

    /// Subscribe to room-level events
    fn events(&self) -> broadcast::Receiver<RoomEvent>;

    /// Subscribe to mute/unmute events of a single track
    fn track_events(&self, track_sid: &str) -> broadcast::Receiver<TrackEvent>;

    /// Local camera frames, if a camera track is available
    fn video_frames(&self) -> Option<VideoFrameSource>;

    /// Get transport name for logging
    fn name(&self) -> &str;
}

/// Read-only handle to a connected room
///
/// Handed to components that need the live connection. It can observe the
/// room but cannot connect or release it; that stays with the session
/// controller.
#[derive(Clone)]
pub struct RoomContext {
    transport: Arc<dyn MediaTransport>,
    room_name: String,
}

impl RoomContext {
    pub(crate) fn new(transport: Arc<dyn MediaTransport>, room_name: String) -> Self {
        Self {
            transport,
            room_name,
        }
    }

    pub fn room_name(&self) -> &str {
        &self.room_name
    }

    pub fn transport_name(&self) -> &str {
        self.transport.name()
    }

    pub fn events(&self) -> broadcast::Receiver<RoomEvent> {
        self.transport.events()
    }

    pub fn video_frames(&self) -> Option<VideoFrameSource> {
        self.transport.video_frames()
    }
}

impl std::fmt::Debug for RoomContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomContext")
            .field("room_name", &self.room_name)
            .field("transport", &self.transport.name())
            .finish()
    }
}
