use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;

use super::eye::NatsEngagementAnalyzer;
use super::voice::NatsVoiceAnalyzer;
use crate::media::VideoFrameSource;

/// Which analyzer a status or failure refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyzerKind {
    Voice,
    Engagement,
}

impl AnalyzerKind {
    /// Capture device the analyzer depends on
    pub fn device(self) -> &'static str {
        match self {
            AnalyzerKind::Voice => "microphone",
            AnalyzerKind::Engagement => "camera",
        }
    }
}

/// Speech quality indicators produced by the voice analyzer
///
/// Passed through to presentation untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VoiceMetrics {
    /// Articulation clarity, 0-100
    #[serde(default)]
    pub clarity: Option<f64>,
    /// Speaking pace in words per minute
    #[serde(default)]
    pub pace_wpm: Option<f64>,
    /// Perceived volume, 0-100
    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default)]
    pub filler_words: Option<u32>,
    /// Latest transcript, only with deep analysis
    #[serde(default)]
    pub transcript: Option<String>,
}

/// Latest output of a voice analyzer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VoiceReading {
    /// Input level, 0-100
    pub audio_level: f64,
    pub voice_metrics: VoiceMetrics,
}

/// Speech-quality analyzer
#[async_trait::async_trait]
pub trait VoiceMetricsSource: Send + Sync {
    /// Start capturing and analyzing audio
    async fn start(&mut self) -> Result<()>;

    /// Stop capturing
    async fn stop(&mut self) -> Result<()>;

    /// Most recent reading, `None` until the analyzer has produced one
    fn latest(&self) -> Option<VoiceReading>;

    fn is_running(&self) -> bool;

    /// Get analyzer name for logging
    fn name(&self) -> &str;
}

/// Eye-contact / engagement analyzer
#[async_trait::async_trait]
pub trait EngagementSource: Send + Sync {
    /// Start analyzing frames from `frames`
    async fn start(&mut self, frames: VideoFrameSource) -> Result<()>;

    async fn stop(&mut self) -> Result<()>;

    /// Most recent confidence in [0, 1], `None` until one was produced
    fn confidence(&self) -> Option<f64>;

    fn is_running(&self) -> bool;

    fn name(&self) -> &str;
}

/// Voice analyzer options
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoiceAnalyzerConfig {
    /// Request transcription-based metrics
    #[serde(default)]
    pub enable_deep_speech_analysis: bool,
    /// Speech-to-text API key, required for deep analysis
    #[serde(default)]
    pub api_key: Option<String>,
}

impl VoiceAnalyzerConfig {
    /// Deep analysis is only effective when requested and a key is present
    pub fn deep_analysis_enabled(&self) -> bool {
        self.enable_deep_speech_analysis
            && self
                .api_key
                .as_deref()
                .is_some_and(|key| !key.trim().is_empty())
    }
}

/// Eye-tracking analyzer options
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EyeTrackingConfig {
    /// Draw the debug overlay
    #[serde(default)]
    pub enable_visualization: bool,
    /// Trade accuracy for lower compute
    #[serde(default)]
    pub use_simple_detector: bool,
}

/// Latest-value cell an analyzer task publishes into
#[derive(Debug)]
pub(crate) struct LatestValue<T> {
    tx: watch::Sender<Option<T>>,
}

impl<T: Clone> LatestValue<T> {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            tx: watch::channel(None).0,
        })
    }

    pub fn publish(&self, value: T) {
        self.tx.send_replace(Some(value));
    }

    pub fn clear(&self) {
        self.tx.send_replace(None);
    }

    pub fn get(&self) -> Option<T> {
        self.tx.borrow().clone()
    }
}

/// Analyzer factory
pub struct AnalyzerFactory;

impl AnalyzerFactory {
    /// Create the NATS-backed voice analyzer for a session
    pub fn voice(
        nats_url: &str,
        session_id: &str,
        config: VoiceAnalyzerConfig,
    ) -> Box<dyn VoiceMetricsSource> {
        Box::new(NatsVoiceAnalyzer::new(nats_url, session_id, config))
    }

    /// Create the NATS-backed eye-tracking analyzer for a session
    pub fn engagement(
        nats_url: &str,
        session_id: &str,
        config: EyeTrackingConfig,
    ) -> Box<dyn EngagementSource> {
        Box::new(NatsEngagementAnalyzer::new(nats_url, session_id, config))
    }
}
