// Eye-tracking analyzer backed by a vision service on NATS.
//
// Camera frames are read from the shared frame source (never written) and
// forwarded base64-encoded; the service answers with a confidence value per
// analysed frame.

use anyhow::{Context, Result};
use futures::stream::StreamExt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::source::{EngagementSource, EyeTrackingConfig, LatestValue};
use crate::media::VideoFrameSource;
use crate::nats::client::{VISION_CONFIDENCE, VISION_CONTROL};
use crate::nats::{AnalyzerCommand, ConfidenceMessage, NatsClient};

pub struct NatsEngagementAnalyzer {
    nats_url: String,
    session_id: String,
    config: EyeTrackingConfig,
    confidence: Arc<LatestValue<f64>>,
    client: Option<Arc<NatsClient>>,
    task: Option<(CancellationToken, JoinHandle<()>)>,
}

impl NatsEngagementAnalyzer {
    pub fn new(nats_url: &str, session_id: &str, config: EyeTrackingConfig) -> Self {
        Self {
            nats_url: nats_url.to_string(),
            session_id: session_id.to_string(),
            config,
            confidence: LatestValue::new(),
            client: None,
            task: None,
        }
    }

    pub(crate) fn apply_message(latest: &LatestValue<f64>, message: ConfidenceMessage) {
        if let Some(reason) = message.error {
            warn!("Eye tracking reported a device error: {}", reason);
            latest.clear();
            return;
        }

        let confidence = if message.confidence.is_finite() {
            message.confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        latest.publish(confidence);
    }
}

#[async_trait::async_trait]
impl EngagementSource for NatsEngagementAnalyzer {
    async fn start(&mut self, mut frames: VideoFrameSource) -> Result<()> {
        if self.task.is_some() {
            warn!("Eye tracking already started");
            return Ok(());
        }

        info!(
            "Starting eye tracking for session {} (visualization={}, simple_detector={})",
            self.session_id, self.config.enable_visualization, self.config.use_simple_detector
        );

        let client = Arc::new(
            NatsClient::connect(&self.nats_url, self.session_id.clone())
                .await
                .context("Eye tracking service unreachable")?,
        );

        let mut subscriber = client
            .subscribe(VISION_CONFIDENCE)
            .await
            .context("Failed to subscribe to engagement confidence")?;

        let visualization = self.config.enable_visualization;
        let simple_detector = self.config.use_simple_detector;
        client
            .publish_control(VISION_CONTROL, AnalyzerCommand::Start, |msg| {
                msg.visualization = Some(visualization);
                msg.simple_detector = Some(simple_detector);
            })
            .await
            .context("Failed to start eye tracking")?;

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let latest = Arc::clone(&self.confidence);
        let publisher = Arc::clone(&client);
        let session_id = self.session_id.clone();

        let task = tokio::spawn(async move {
            info!("Eye tracking task started");

            let mut sequence: u64 = 0;
            let mut frames_open = true;

            loop {
                tokio::select! {
                    biased;
                    () = token.cancelled() => break,
                    frame = frames.next_frame(), if frames_open => match frame {
                        Some(frame) => {
                            if let Err(e) = publisher.publish_video_frame(&frame, sequence).await {
                                error!("Failed to forward video frame: {}", e);
                            }
                            sequence += 1;
                        }
                        None => {
                            debug!("Camera frame source closed");
                            frames_open = false;
                        }
                    },
                    msg = subscriber.next() => {
                        let Some(msg) = msg else { break };

                        match serde_json::from_slice::<ConfidenceMessage>(&msg.payload) {
                            Ok(message) if message.session_id == session_id => {
                                NatsEngagementAnalyzer::apply_message(&latest, message);
                            }
                            Ok(_) => {}
                            Err(e) => warn!("Failed to parse confidence message: {}", e),
                        }
                    }
                }
            }

            info!("Eye tracking task stopped ({} frames forwarded)", sequence);
        });

        self.client = Some(client);
        self.task = Some((cancel, task));

        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        let Some((cancel, task)) = self.task.take() else {
            return Ok(());
        };

        info!("Stopping eye tracking for session {}", self.session_id);

        cancel.cancel();
        if let Err(e) = task.await {
            error!("Eye tracking task panicked: {}", e);
        }
        self.confidence.clear();

        if let Some(client) = self.client.take() {
            client
                .publish_control(VISION_CONTROL, AnalyzerCommand::Stop, |_| {})
                .await
                .context("Failed to stop eye tracking")?;
            client.close().await?;
        }

        Ok(())
    }

    fn confidence(&self) -> Option<f64> {
        self.confidence.get()
    }

    fn is_running(&self) -> bool {
        self.task.is_some()
    }

    fn name(&self) -> &str {
        "nats-eye-tracking"
    }
}
