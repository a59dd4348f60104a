// Voice analyzer backed by a speech-analysis service on NATS.
//
// The service owns the microphone. We ask it to start/stop for our session
// and keep the latest metrics it publishes on `voice.metrics.<session>`.

use anyhow::{Context, Result};
use futures::stream::StreamExt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::source::{LatestValue, VoiceAnalyzerConfig, VoiceMetricsSource, VoiceReading};
use crate::nats::client::{VOICE_CONTROL, VOICE_METRICS};
use crate::nats::{AnalyzerCommand, NatsClient, VoiceMetricsMessage};

pub struct NatsVoiceAnalyzer {
    nats_url: String,
    session_id: String,
    config: VoiceAnalyzerConfig,
    latest: Arc<LatestValue<VoiceReading>>,
    client: Option<Arc<NatsClient>>,
    task: Option<(CancellationToken, JoinHandle<()>)>,
}

impl NatsVoiceAnalyzer {
    pub fn new(nats_url: &str, session_id: &str, config: VoiceAnalyzerConfig) -> Self {
        Self {
            nats_url: nats_url.to_string(),
            session_id: session_id.to_string(),
            config,
            latest: LatestValue::new(),
            client: None,
            task: None,
        }
    }

    /// Turn a metrics message into the latest reading
    pub(crate) fn apply_message(latest: &LatestValue<VoiceReading>, message: VoiceMetricsMessage) {
        if let Some(reason) = message.error {
            warn!("Voice analyzer reported a device error: {}", reason);
            latest.clear();
            return;
        }

        let audio_level = if message.audio_level.is_finite() {
            message.audio_level.clamp(0.0, 100.0)
        } else {
            0.0
        };

        latest.publish(VoiceReading {
            audio_level,
            voice_metrics: message.metrics,
        });
    }
}

#[async_trait::async_trait]
impl VoiceMetricsSource for NatsVoiceAnalyzer {
    async fn start(&mut self) -> Result<()> {
        if self.task.is_some() {
            warn!("Voice analyzer already started");
            return Ok(());
        }

        info!("Starting voice analyzer for session {}", self.session_id);

        let client = Arc::new(
            NatsClient::connect(&self.nats_url, self.session_id.clone())
                .await
                .context("Voice analyzer service unreachable")?,
        );

        let deep_analysis = self.config.deep_analysis_enabled();
        if self.config.enable_deep_speech_analysis && !deep_analysis {
            warn!("Deep speech analysis requested without an API key; using basic metrics");
        }

        let mut subscriber = client
            .subscribe(VOICE_METRICS)
            .await
            .context("Failed to subscribe to voice metrics")?;

        client
            .publish_control(VOICE_CONTROL, AnalyzerCommand::Start, |msg| {
                msg.deep_analysis = Some(deep_analysis);
            })
            .await
            .context("Failed to start voice analysis")?;

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let latest = Arc::clone(&self.latest);
        let session_id = self.session_id.clone();

        let task = tokio::spawn(async move {
            info!("Voice metrics task started");

            loop {
                tokio::select! {
                    biased;
                    () = token.cancelled() => break,
                    msg = subscriber.next() => {
                        let Some(msg) = msg else { break };

                        match serde_json::from_slice::<VoiceMetricsMessage>(&msg.payload) {
                            Ok(message) if message.session_id == session_id => {
                                NatsVoiceAnalyzer::apply_message(&latest, message);
                            }
                            Ok(_) => {}
                            Err(e) => warn!("Failed to parse voice metrics message: {}", e),
                        }
                    }
                }
            }

            info!("Voice metrics task stopped");
        });

        self.client = Some(client);
        self.task = Some((cancel, task));

        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        let Some((cancel, task)) = self.task.take() else {
            return Ok(());
        };

        info!("Stopping voice analyzer for session {}", self.session_id);

        cancel.cancel();
        if let Err(e) = task.await {
            error!("Voice metrics task panicked: {}", e);
        }
        self.latest.clear();

        if let Some(client) = self.client.take() {
            client
                .publish_control(VOICE_CONTROL, AnalyzerCommand::Stop, |_| {})
                .await
                .context("Failed to stop voice analysis")?;
            client.close().await?;
        }

        Ok(())
    }

    fn latest(&self) -> Option<VoiceReading> {
        self.latest.get()
    }

    fn is_running(&self) -> bool {
        self.task.is_some()
    }

    fn name(&self) -> &str {
        "nats-voice"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::VoiceMetrics;

    fn message(audio_level: f64, error: Option<&str>) -> VoiceMetricsMessage {
        VoiceMetricsMessage {
            session_id: "s1".to_string(),
            audio_level,
            metrics: VoiceMetrics {
                clarity: Some(70.0),
                ..VoiceMetrics::default()
            },
            error: error.map(str::to_string),
            timestamp: "2025-10-27T14:30:00Z".to_string(),
        }
    }

    #[test]
    fn test_reading_is_clamped() {
        let latest: Arc<LatestValue<VoiceReading>> = LatestValue::new();

        NatsVoiceAnalyzer::apply_message(&latest, message(140.0, None));
        assert_eq!(latest.get().unwrap().audio_level, 100.0);

        NatsVoiceAnalyzer::apply_message(&latest, message(f64::NAN, None));
        assert_eq!(latest.get().unwrap().audio_level, 0.0);
        assert_eq!(latest.get().unwrap().voice_metrics.clarity, Some(70.0));
    }

    #[test]
    fn test_device_error_clears_reading() {
        let latest: Arc<LatestValue<VoiceReading>> = LatestValue::new();

        NatsVoiceAnalyzer::apply_message(&latest, message(40.0, None));
        NatsVoiceAnalyzer::apply_message(&latest, message(40.0, Some("permission denied")));

        assert!(latest.get().is_none());
    }

    #[tokio::test]
    async fn test_stop_before_start_is_noop() {
        let mut analyzer =
            NatsVoiceAnalyzer::new("nats://localhost:4222", "s1", VoiceAnalyzerConfig::default());

        analyzer.stop().await.unwrap();
        assert!(!analyzer.is_running());
        assert!(analyzer.latest().is_none());
    }
}
