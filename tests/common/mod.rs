#![allow(dead_code)]

use anyhow::{bail, Result};
use confidence_compass::media::VideoFrameSource;
use confidence_compass::{
    EngagementSource, Notification, NotificationKind, VoiceMetrics, VoiceMetricsSource,
    VoiceReading,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

pub const SERVER_URL: &str = "wss://example";
pub const TOKEN: &str = "T";

/// Let spawned listener and timer tasks run without advancing paused time
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

/// Everything delivered so far, without waiting
pub fn drain(rx: &mut UnboundedReceiver<Notification>) -> Vec<NotificationKind> {
    let mut kinds = Vec::new();
    while let Ok(n) = rx.try_recv() {
        kinds.push(n.kind);
    }
    kinds
}

/// Wait until a notification of `kind` arrives, skipping others
///
/// For multi-threaded tests, where handlers run on other workers.
pub async fn wait_for(rx: &mut UnboundedReceiver<Notification>, kind: NotificationKind) {
    let found = tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(n) = rx.recv().await {
            if n.kind == kind {
                return true;
            }
        }
        false
    })
    .await;

    assert!(matches!(found, Ok(true)), "no {:?} notification", kind);
}

/// Start/stop counters shared with a fake source
#[derive(Clone, Default)]
pub struct SourceCounters {
    starts: Arc<AtomicUsize>,
    stops: Arc<AtomicUsize>,
}

impl SourceCounters {
    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

/// Voice source that reports a fixed reading while running
pub struct StaticVoiceSource {
    reading: Option<VoiceReading>,
    failure: Option<String>,
    running: bool,
    counters: SourceCounters,
}

impl StaticVoiceSource {
    pub fn new(audio_level: f64) -> (Self, SourceCounters) {
        Self::build(
            Some(VoiceReading {
                audio_level,
                voice_metrics: VoiceMetrics {
                    clarity: Some(80.0),
                    pace_wpm: Some(140.0),
                    ..VoiceMetrics::default()
                },
            }),
            None,
        )
    }

    /// Starts fine but never produces a reading
    pub fn silent() -> (Self, SourceCounters) {
        Self::build(None, None)
    }

    pub fn failing(reason: &str) -> (Self, SourceCounters) {
        Self::build(None, Some(reason.to_string()))
    }

    fn build(reading: Option<VoiceReading>, failure: Option<String>) -> (Self, SourceCounters) {
        let counters = SourceCounters::default();
        let source = Self {
            reading,
            failure,
            running: false,
            counters: counters.clone(),
        };
        (source, counters)
    }
}

#[async_trait::async_trait]
impl VoiceMetricsSource for StaticVoiceSource {
    async fn start(&mut self) -> Result<()> {
        self.counters.starts.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = &self.failure {
            bail!("{}", reason);
        }
        self.running = true;
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        self.counters.stops.fetch_add(1, Ordering::SeqCst);
        self.running = false;
        Ok(())
    }

    fn latest(&self) -> Option<VoiceReading> {
        if self.running {
            self.reading.clone()
        } else {
            None
        }
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn name(&self) -> &str {
        "static-voice"
    }
}

/// Engagement source that reports a fixed confidence while running
pub struct StaticEngagementSource {
    confidence: Option<f64>,
    failure: Option<String>,
    frames: Option<VideoFrameSource>,
    counters: SourceCounters,
}

impl StaticEngagementSource {
    pub fn new(confidence: f64) -> (Self, SourceCounters) {
        Self::build(Some(confidence), None)
    }

    pub fn silent() -> (Self, SourceCounters) {
        Self::build(None, None)
    }

    pub fn failing(reason: &str) -> (Self, SourceCounters) {
        Self::build(None, Some(reason.to_string()))
    }

    fn build(confidence: Option<f64>, failure: Option<String>) -> (Self, SourceCounters) {
        let counters = SourceCounters::default();
        let source = Self {
            confidence,
            failure,
            frames: None,
            counters: counters.clone(),
        };
        (source, counters)
    }
}

#[async_trait::async_trait]
impl EngagementSource for StaticEngagementSource {
    async fn start(&mut self, frames: VideoFrameSource) -> Result<()> {
        self.counters.starts.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = &self.failure {
            bail!("{}", reason);
        }
        self.frames = Some(frames);
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        self.counters.stops.fetch_add(1, Ordering::SeqCst);
        self.frames = None;
        Ok(())
    }

    fn confidence(&self) -> Option<f64> {
        self.frames.as_ref().and(self.confidence)
    }

    fn is_running(&self) -> bool {
        self.frames.is_some()
    }

    fn name(&self) -> &str {
        "static-engagement"
    }
}
