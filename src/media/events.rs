use serde::{Deserialize, Serialize};

/// Kind of media carried by a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Audio,
    Video,
}

/// A track published by a remote participant and subscribed by us
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTrack {
    /// Transport-assigned track identifier
    pub sid: String,
    pub kind: TrackKind,
    /// Identity of the publishing participant
    pub participant: String,
}

impl RemoteTrack {
    pub fn audio(sid: impl Into<String>, participant: impl Into<String>) -> Self {
        Self {
            sid: sid.into(),
            kind: TrackKind::Audio,
            participant: participant.into(),
        }
    }

    pub fn video(sid: impl Into<String>, participant: impl Into<String>) -> Self {
        Self {
            sid: sid.into(),
            kind: TrackKind::Video,
            participant: participant.into(),
        }
    }
}

/// Connection state as reported by the media transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

/// Room-level events emitted by the media transport
#[derive(Debug, Clone, PartialEq)]
pub enum RoomEvent {
    TrackSubscribed(RemoteTrack),
    TrackUnsubscribed(RemoteTrack),
    ParticipantConnected { identity: String },
    ParticipantDisconnected { identity: String },
    ConnectionStateChanged(ConnectionState),
}

impl RoomEvent {
    pub fn kind(&self) -> RoomEventKind {
        match self {
            RoomEvent::TrackSubscribed(_) => RoomEventKind::TrackSubscribed,
            RoomEvent::TrackUnsubscribed(_) => RoomEventKind::TrackUnsubscribed,
            RoomEvent::ParticipantConnected { .. } => RoomEventKind::ParticipantConnected,
            RoomEvent::ParticipantDisconnected { .. } => RoomEventKind::ParticipantDisconnected,
            RoomEvent::ConnectionStateChanged(_) => RoomEventKind::ConnectionStateChanged,
        }
    }
}

/// Discriminant of [`RoomEvent`], used as the key of a listener registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomEventKind {
    TrackSubscribed,
    TrackUnsubscribed,
    ParticipantConnected,
    ParticipantDisconnected,
    ConnectionStateChanged,
}

impl RoomEventKind {
    pub const ALL: [RoomEventKind; 5] = [
        RoomEventKind::TrackSubscribed,
        RoomEventKind::TrackUnsubscribed,
        RoomEventKind::ParticipantConnected,
        RoomEventKind::ParticipantDisconnected,
        RoomEventKind::ConnectionStateChanged,
    ];
}

/// Track-level events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackEvent {
    Muted,
    Unmuted,
}
