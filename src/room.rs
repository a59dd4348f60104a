// Conversation room: the session controller and the metrics engine composed
// behind the presentation boundary.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::analyzer::{EngagementSource, VoiceMetrics, VoiceMetricsSource};
use crate::error::SessionError;
use crate::media::MediaTransport;
use crate::metrics::{MetricsEngine, MetricsSnapshot, SourceStatus};
use crate::session::{ConnectionStatus, Notifier, SessionConfig, SessionController};

/// Everything the presentation layer renders, derived from the latest
/// snapshot and the connection state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresentationState {
    pub voice_metrics: VoiceMetrics,
    pub eye_contact_score: f64,
    pub overall_score: u8,
    pub session_timer_text: String,
    /// True while connected
    pub is_active: bool,
    pub audio_level: f64,
    pub audio_measured: bool,
    pub eye_contact_measured: bool,
    pub connection: ConnectionStatus,
    /// Reason for the `error` state, shown with the exit control
    pub error: Option<String>,
}

impl PresentationState {
    fn new(snapshot: MetricsSnapshot, connection: ConnectionStatus, error: Option<String>) -> Self {
        Self {
            voice_metrics: snapshot.voice_metrics,
            eye_contact_score: snapshot.eye_contact_score,
            overall_score: snapshot.overall_score,
            session_timer_text: snapshot.session_timer_text,
            is_active: connection == ConnectionStatus::Connected,
            audio_level: snapshot.audio_level,
            audio_measured: snapshot.audio_measured,
            eye_contact_measured: snapshot.eye_contact_measured,
            connection,
            error,
        }
    }
}

pub struct ConversationRoom {
    controller: SessionController,
    engine: Mutex<MetricsEngine>,
}

impl ConversationRoom {
    pub fn new(
        config: SessionConfig,
        transport: Arc<dyn MediaTransport>,
        voice: Box<dyn VoiceMetricsSource>,
        engagement: Box<dyn EngagementSource>,
        notifier: Notifier,
    ) -> Self {
        Self {
            engine: Mutex::new(MetricsEngine::new(voice, engagement, notifier.clone())),
            controller: SessionController::new(config, transport, notifier),
        }
    }

    /// Connect with the configured credentials, then start the analyzers
    pub async fn join(&self) -> Result<(), SessionError> {
        let (server_url, token) = {
            let config = self.controller.config();
            (config.server_url.clone(), config.token.clone())
        };

        self.controller.connect(&server_url, &token).await?;

        // on_end holds the engine lock across stop + teardown, so checking the
        // status under it keeps a late start from outliving the session.
        let mut engine = self.engine.lock().await;
        match self.controller.room().await {
            Some(room) => {
                engine.start(room.video_frames()).await;
                Ok(())
            }
            None => {
                warn!("Session ended before the analyzers could start");
                Err(SessionError::Cancelled)
            }
        }
    }

    /// Current presentation state
    pub async fn render(&self) -> PresentationState {
        let snapshot = self
            .engine
            .lock()
            .await
            .sample(self.controller.duration_secs());

        PresentationState::new(
            snapshot,
            self.controller.status().await,
            self.controller.last_error().await,
        )
    }

    /// End the session: stop the analyzers, then tear the session down
    ///
    /// Returns once both have completed. Safe to call more than once.
    pub async fn on_end(&self) {
        let mut engine = self.engine.lock().await;
        engine.stop().await;
        self.controller.teardown().await;

        info!("Conversation room {} ended", self.controller.config().room_name);
    }

    pub async fn status(&self) -> ConnectionStatus {
        self.controller.status().await
    }

    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    /// Whether the analyzers are currently started
    pub async fn analyzers_started(&self) -> bool {
        self.engine.lock().await.is_started()
    }

    /// Voice and engagement source status, in that order
    pub async fn source_status(&self) -> (SourceStatus, SourceStatus) {
        let engine = self.engine.lock().await;
        (engine.voice_status().clone(), engine.engagement_status().clone())
    }
}
