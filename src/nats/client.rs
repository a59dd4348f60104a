use anyhow::{Context, Result};
use async_nats::Client;
use base64::Engine;
use serde::Serialize;
use tracing::{debug, info};

use super::messages::{AnalyzerCommand, AnalyzerControlMessage, VideoFrameMessage};
use crate::media::VideoFrame;

/// Subject prefixes, suffixed with `.<session_id>`
pub const VOICE_CONTROL: &str = "voice.control";
pub const VOICE_METRICS: &str = "voice.metrics";
pub const VISION_CONTROL: &str = "vision.control";
pub const VISION_FRAME: &str = "vision.frame";
pub const VISION_CONFIDENCE: &str = "vision.confidence";

pub struct NatsClient {
    client: Client,
    session_id: String,
}

impl NatsClient {
    /// Connect to NATS server
    pub async fn connect(url: &str, session_id: String) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let client = async_nats::connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self { client, session_id })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Session-scoped subject for `prefix`
    pub fn subject(&self, prefix: &str) -> String {
        format!("{}.{}", prefix, self.session_id)
    }

    /// Publish a JSON payload
    pub async fn publish_json<T: Serialize>(&self, subject: String, message: &T) -> Result<()> {
        let payload = serde_json::to_vec(message)?;

        self.client
            .publish(subject.clone(), payload.into())
            .await
            .with_context(|| format!("Failed to publish to {}", subject))?;

        Ok(())
    }

    /// Ask an analyzer service to start or stop work for this session
    pub async fn publish_control(
        &self,
        prefix: &str,
        command: AnalyzerCommand,
        configure: impl FnOnce(&mut AnalyzerControlMessage),
    ) -> Result<()> {
        let mut message = AnalyzerControlMessage {
            session_id: self.session_id.clone(),
            command,
            timestamp: chrono::Utc::now().to_rfc3339(),
            deep_analysis: None,
            visualization: None,
            simple_detector: None,
        };
        configure(&mut message);

        let subject = self.subject(prefix);
        self.publish_json(subject.clone(), &message).await?;

        info!("Published {:?} to {}", command, subject);
        Ok(())
    }

    /// Forward a camera frame to the eye-tracking analyzer
    pub async fn publish_video_frame(&self, frame: &VideoFrame, sequence: u64) -> Result<()> {
        let message = VideoFrameMessage {
            session_id: self.session_id.clone(),
            sequence,
            width: frame.width,
            height: frame.height,
            data: base64::engine::general_purpose::STANDARD.encode(&frame.data),
            timestamp_ms: frame.timestamp_ms,
        };

        self.publish_json(self.subject(VISION_FRAME), &message)
            .await
            .context("Failed to publish video frame")?;

        debug!(
            "Published video frame {} ({}x{}, {} bytes)",
            sequence,
            frame.width,
            frame.height,
            frame.data.len()
        );

        Ok(())
    }

    /// Subscribe to a session-scoped subject
    pub async fn subscribe(&self, prefix: &str) -> Result<async_nats::Subscriber> {
        let subject = self.subject(prefix);

        info!("Subscribing to {}", subject);

        let subscriber = self
            .client
            .subscribe(subject.clone())
            .await
            .with_context(|| format!("Failed to subscribe to {}", subject))?;

        Ok(subscriber)
    }

    /// Flush pending publishes
    pub async fn close(&self) -> Result<()> {
        info!("Closing NATS connection");
        self.client
            .flush()
            .await
            .context("Failed to flush NATS connection")?;
        // async-nats handles cleanup on drop
        Ok(())
    }
}

