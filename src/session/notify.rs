// User-facing notifications.
//
// Every error or degradation category produces exactly one notification. The
// presentation layer decides how to show them; here they are just values on a
// channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::analyzer::AnalyzerKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Connected,
    ConnectionFailed,
    TrackMuted,
    TrackDegraded,
    ConnectionLost,
    DeviceUnavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Destructive,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub at: DateTime<Utc>,
}

impl Notification {
    fn new(kind: NotificationKind, title: &str, description: String, severity: Severity) -> Self {
        Self {
            kind,
            title: title.to_string(),
            description,
            severity,
            at: Utc::now(),
        }
    }

    pub fn connected() -> Self {
        Self::new(
            NotificationKind::Connected,
            "Connected",
            "Successfully connected to conversation room.".to_string(),
            Severity::Info,
        )
    }

    pub fn connection_failed() -> Self {
        Self::new(
            NotificationKind::ConnectionFailed,
            "Connection Error",
            "Failed to connect to conversation room. Please try again.".to_string(),
            Severity::Destructive,
        )
    }

    pub fn track_muted() -> Self {
        Self::new(
            NotificationKind::TrackMuted,
            "Audio Muted",
            "The audio track has been muted. Please check your microphone settings.".to_string(),
            Severity::Warning,
        )
    }

    pub fn track_degraded() -> Self {
        Self::new(
            NotificationKind::TrackDegraded,
            "Audio Disconnected",
            "The audio connection has been lost. Attempting to reconnect...".to_string(),
            Severity::Destructive,
        )
    }

    pub fn connection_lost() -> Self {
        Self::new(
            NotificationKind::ConnectionLost,
            "Connection Lost",
            "Lost connection to the room. Attempting to reconnect...".to_string(),
            Severity::Destructive,
        )
    }

    pub fn device_unavailable(analyzer: AnalyzerKind) -> Self {
        let (title, description) = match analyzer {
            AnalyzerKind::Voice => (
                "Microphone Unavailable",
                "Speech analysis could not start. Voice metrics will read 0 for this session.",
            ),
            AnalyzerKind::Engagement => (
                "Camera Unavailable",
                "Eye tracking could not start. Eye contact will read 0 for this session.",
            ),
        };

        Self::new(
            NotificationKind::DeviceUnavailable,
            title,
            description.to_string(),
            Severity::Warning,
        )
    }
}

/// Sending half of the notification channel
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl Notifier {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn send(&self, notification: Notification) {
        debug!("Notification: {} ({:?})", notification.title, notification.kind);

        if self.tx.send(notification).is_err() {
            warn!("Notification dropped: no presentation layer listening");
        }
    }
}
