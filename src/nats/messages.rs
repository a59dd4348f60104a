use serde::{Deserialize, Serialize};

use crate::analyzer::VoiceMetrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalyzerCommand {
    Start,
    Stop,
}

/// Start/stop request published to an analyzer service
#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzerControlMessage {
    pub session_id: String,
    pub command: AnalyzerCommand,
    pub timestamp: String, // RFC3339 timestamp
    /// Voice: transcription-based metrics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deep_analysis: Option<bool>,
    /// Eye tracking: draw debug overlay
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visualization: Option<bool>,
    /// Eye tracking: cheaper detector
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simple_detector: Option<bool>,
}

/// Voice metrics published by the voice analyzer
#[derive(Debug, Serialize, Deserialize)]
pub struct VoiceMetricsMessage {
    pub session_id: String,
    /// Input level, 0-100
    #[serde(default)]
    pub audio_level: f64,
    #[serde(default)]
    pub metrics: VoiceMetrics,
    /// Set when the analyzer lost its capture device
    #[serde(default)]
    pub error: Option<String>,
    pub timestamp: String,
}

/// Engagement confidence published by the eye-tracking analyzer
#[derive(Debug, Serialize, Deserialize)]
pub struct ConfidenceMessage {
    pub session_id: String,
    /// Eye contact confidence, 0.0-1.0
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub error: Option<String>,
    pub timestamp: String,
}

/// Camera frame forwarded to the eye-tracking analyzer
#[derive(Debug, Serialize, Deserialize)]
pub struct VideoFrameMessage {
    pub session_id: String,
    pub sequence: u64,
    pub width: u32,
    pub height: u32,
    pub data: String, // Base64-encoded RGBA bytes
    pub timestamp_ms: u64,
}
