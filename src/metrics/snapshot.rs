use serde::Serialize;

use crate::analyzer::{VoiceMetrics, VoiceReading};
use crate::session::format_timer;

/// Fused view of both analyzers at one sampling instant
///
/// Recomputed from the latest source values on every sample, never
/// accumulated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    /// Input level, 0-100
    pub audio_level: f64,
    pub voice_metrics: VoiceMetrics,
    /// Eye contact, 0-100, unrounded
    pub eye_contact_score: f64,
    /// Mean of eye contact and audio level, 0-100
    pub overall_score: u8,
    /// Session duration as `MM:SS`
    pub session_timer_text: String,
    /// Whether `audio_level` came from the voice analyzer or is the 0 default
    pub audio_measured: bool,
    /// Whether `eye_contact_score` came from eye tracking or is the 0 default
    pub eye_contact_measured: bool,
}

impl MetricsSnapshot {
    /// Fuse the latest source values; a missing value contributes 0
    pub fn fuse(voice: Option<VoiceReading>, confidence: Option<f64>, elapsed_secs: u64) -> Self {
        let audio_measured = voice.is_some();
        let eye_contact_measured = confidence.is_some();

        let VoiceReading {
            audio_level,
            voice_metrics,
        } = voice.unwrap_or_default();
        let audio_level = clamp_percent(audio_level);

        let eye_contact_score = eye_contact_score(confidence.unwrap_or(0.0));

        Self {
            audio_level,
            voice_metrics,
            eye_contact_score,
            overall_score: overall_score(eye_contact_score, audio_level),
            session_timer_text: format_timer(elapsed_secs),
            audio_measured,
            eye_contact_measured,
        }
    }
}

/// Eye contact score for a confidence in [0, 1]
pub fn eye_contact_score(confidence: f64) -> f64 {
    if !confidence.is_finite() {
        return 0.0;
    }
    confidence.clamp(0.0, 1.0) * 100.0
}

/// Round-half-up mean of the two percentages
pub fn overall_score(eye_contact_score: f64, audio_level: f64) -> u8 {
    let mean = (clamp_percent(eye_contact_score) + clamp_percent(audio_level)) / 2.0;
    (mean + 0.5).floor().clamp(0.0, 100.0) as u8
}

fn clamp_percent(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}
