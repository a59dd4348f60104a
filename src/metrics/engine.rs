use serde::Serialize;
use tracing::{error, info, warn};

use super::snapshot::MetricsSnapshot;
use crate::analyzer::{AnalyzerKind, EngagementSource, VoiceMetricsSource};
use crate::error::SessionError;
use crate::media::VideoFrameSource;
use crate::session::{Notification, Notifier};

/// Lifecycle of one analyzer as seen by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "reason")]
pub enum SourceStatus {
    Stopped,
    Running,
    /// Failed to start; its score reads 0 until the next start
    Unavailable(String),
}

/// Starts, stops and samples the voice and engagement analyzers
///
/// Each source is isolated: one failing to start only degrades its own
/// score.
pub struct MetricsEngine {
    voice: Box<dyn VoiceMetricsSource>,
    engagement: Box<dyn EngagementSource>,
    notifier: Notifier,
    voice_status: SourceStatus,
    engagement_status: SourceStatus,
    started: bool,
}

impl MetricsEngine {
    pub fn new(
        voice: Box<dyn VoiceMetricsSource>,
        engagement: Box<dyn EngagementSource>,
        notifier: Notifier,
    ) -> Self {
        Self {
            voice,
            engagement,
            notifier,
            voice_status: SourceStatus::Stopped,
            engagement_status: SourceStatus::Stopped,
            started: false,
        }
    }

    /// Start both sources. Calling it again while started does nothing.
    ///
    /// `frames` is the room's camera feed; without one, eye tracking is
    /// unavailable for the session.
    pub async fn start(&mut self, frames: Option<VideoFrameSource>) {
        if self.started {
            warn!("Metrics engine already started");
            return;
        }
        self.started = true;

        info!(
            "Starting metrics engine ({} + {})",
            self.voice.name(),
            self.engagement.name()
        );

        self.voice_status = match self.voice.start().await {
            Ok(()) => SourceStatus::Running,
            Err(e) => self.unavailable(AnalyzerKind::Voice, format!("{:#}", e)),
        };

        self.engagement_status = match frames {
            Some(frames) => match self.engagement.start(frames).await {
                Ok(()) => SourceStatus::Running,
                Err(e) => self.unavailable(AnalyzerKind::Engagement, format!("{:#}", e)),
            },
            None => self.unavailable(
                AnalyzerKind::Engagement,
                "room has no camera feed".to_string(),
            ),
        };
    }

    fn unavailable(&self, analyzer: AnalyzerKind, reason: String) -> SourceStatus {
        let err = SessionError::DeviceUnavailable {
            analyzer,
            reason: reason.clone(),
        };
        warn!("{}; continuing without it", err);

        self.notifier.send(Notification::device_unavailable(analyzer));
        SourceStatus::Unavailable(reason)
    }

    /// Stop every running source. Stop failures are logged, never returned.
    pub async fn stop(&mut self) {
        if !self.started {
            return;
        }

        if self.voice_status == SourceStatus::Running {
            if let Err(e) = self.voice.stop().await {
                error!("Failed to stop {}: {:#}", self.voice.name(), e);
            }
        }
        if self.engagement_status == SourceStatus::Running {
            if let Err(e) = self.engagement.stop().await {
                error!("Failed to stop {}: {:#}", self.engagement.name(), e);
            }
        }

        self.voice_status = SourceStatus::Stopped;
        self.engagement_status = SourceStatus::Stopped;
        self.started = false;

        info!("Metrics engine stopped");
    }

    /// Project the latest source values into a snapshot
    pub fn sample(&self, elapsed_secs: u64) -> MetricsSnapshot {
        let voice = match self.voice_status {
            SourceStatus::Running => self.voice.latest(),
            _ => None,
        };
        let confidence = match self.engagement_status {
            SourceStatus::Running => self.engagement.confidence(),
            _ => None,
        };

        MetricsSnapshot::fuse(voice, confidence, elapsed_secs)
    }

    pub fn voice_status(&self) -> &SourceStatus {
        &self.voice_status
    }

    pub fn engagement_status(&self) -> &SourceStatus {
        &self.engagement_status
    }

    pub fn is_started(&self) -> bool {
        self.started
    }
}
