mod common;

use common::{drain, StaticEngagementSource, StaticVoiceSource};
use confidence_compass::media::video_channel;
use confidence_compass::{MetricsEngine, NotificationKind, Notifier, SourceStatus};

#[tokio::test]
async fn test_sample_fuses_both_sources() {
    let (voice, _) = StaticVoiceSource::new(60.0);
    let (engagement, _) = StaticEngagementSource::new(0.5);
    let (notifier, mut rx) = Notifier::channel();
    let (_sink, frames) = video_channel();

    let mut engine = MetricsEngine::new(Box::new(voice), Box::new(engagement), notifier);
    engine.start(Some(frames)).await;

    assert_eq!(engine.voice_status(), &SourceStatus::Running);
    assert_eq!(engine.engagement_status(), &SourceStatus::Running);

    let snapshot = engine.sample(5);
    assert_eq!(snapshot.audio_level, 60.0);
    assert_eq!(snapshot.eye_contact_score, 50.0);
    assert_eq!(snapshot.overall_score, 55);
    assert_eq!(snapshot.session_timer_text, "00:05");
    assert_eq!(snapshot.voice_metrics.clarity, Some(80.0));
    assert!(snapshot.audio_measured && snapshot.eye_contact_measured);

    assert!(drain(&mut rx).is_empty());
    engine.stop().await;
}

#[tokio::test]
async fn test_start_is_idempotent() {
    let (voice, voice_counters) = StaticVoiceSource::new(10.0);
    let (engagement, eye_counters) = StaticEngagementSource::new(0.1);
    let (notifier, _rx) = Notifier::channel();
    let (_sink, frames) = video_channel();

    let mut engine = MetricsEngine::new(Box::new(voice), Box::new(engagement), notifier);
    engine.start(Some(frames.clone())).await;
    engine.start(Some(frames)).await;

    assert_eq!(voice_counters.starts(), 1);
    assert_eq!(eye_counters.starts(), 1);
    assert!(engine.is_started());
}

#[tokio::test]
async fn test_microphone_denied_degrades_audio_only() {
    let (voice, voice_counters) = StaticVoiceSource::failing("microphone permission denied");
    let (engagement, _) = StaticEngagementSource::new(0.8);
    let (notifier, mut rx) = Notifier::channel();
    let (_sink, frames) = video_channel();

    let mut engine = MetricsEngine::new(Box::new(voice), Box::new(engagement), notifier);
    engine.start(Some(frames)).await;

    assert!(matches!(
        engine.voice_status(),
        SourceStatus::Unavailable(reason) if reason.contains("permission denied")
    ));
    assert_eq!(engine.engagement_status(), &SourceStatus::Running);
    assert_eq!(drain(&mut rx), vec![NotificationKind::DeviceUnavailable]);

    let snapshot = engine.sample(0);
    assert_eq!(snapshot.audio_level, 0.0);
    assert!(!snapshot.audio_measured);
    assert_eq!(snapshot.eye_contact_score, 80.0);
    assert_eq!(snapshot.overall_score, 40);

    // A source that never started is never stopped
    engine.stop().await;
    assert_eq!(voice_counters.stops(), 0);
}

#[tokio::test]
async fn test_missing_camera_feed_disables_eye_tracking() {
    let (voice, _) = StaticVoiceSource::new(50.0);
    let (engagement, eye_counters) = StaticEngagementSource::new(0.9);
    let (notifier, mut rx) = Notifier::channel();

    let mut engine = MetricsEngine::new(Box::new(voice), Box::new(engagement), notifier);
    engine.start(None).await;

    assert_eq!(eye_counters.starts(), 0);
    assert!(matches!(engine.engagement_status(), SourceStatus::Unavailable(_)));
    assert_eq!(drain(&mut rx), vec![NotificationKind::DeviceUnavailable]);

    let snapshot = engine.sample(0);
    assert_eq!(snapshot.eye_contact_score, 0.0);
    assert_eq!(snapshot.overall_score, 25);
}

#[tokio::test]
async fn test_both_sources_failing_is_not_fatal() {
    let (voice, _) = StaticVoiceSource::failing("no microphone");
    let (engagement, _) = StaticEngagementSource::failing("no camera");
    let (notifier, mut rx) = Notifier::channel();
    let (_sink, frames) = video_channel();

    let mut engine = MetricsEngine::new(Box::new(voice), Box::new(engagement), notifier);
    engine.start(Some(frames)).await;

    assert_eq!(
        drain(&mut rx),
        vec![
            NotificationKind::DeviceUnavailable,
            NotificationKind::DeviceUnavailable
        ]
    );
    assert_eq!(engine.sample(3).overall_score, 0);
}

#[tokio::test]
async fn test_silent_sources_read_zero() {
    let (voice, _) = StaticVoiceSource::silent();
    let (engagement, _) = StaticEngagementSource::silent();
    let (notifier, _rx) = Notifier::channel();
    let (_sink, frames) = video_channel();

    let mut engine = MetricsEngine::new(Box::new(voice), Box::new(engagement), notifier);
    engine.start(Some(frames)).await;

    let snapshot = engine.sample(0);
    assert_eq!(snapshot.overall_score, 0);
    assert!(!snapshot.audio_measured);
    assert!(!snapshot.eye_contact_measured);
}

#[tokio::test]
async fn test_stop_then_restart() {
    let (voice, voice_counters) = StaticVoiceSource::new(40.0);
    let (engagement, eye_counters) = StaticEngagementSource::new(0.4);
    let (notifier, _rx) = Notifier::channel();
    let (_sink, frames) = video_channel();

    let mut engine = MetricsEngine::new(Box::new(voice), Box::new(engagement), notifier);
    engine.start(Some(frames.clone())).await;
    engine.stop().await;
    engine.stop().await;

    assert_eq!(voice_counters.stops(), 1);
    assert_eq!(eye_counters.stops(), 1);
    assert!(!engine.is_started());
    assert_eq!(engine.voice_status(), &SourceStatus::Stopped);
    assert_eq!(engine.sample(0).overall_score, 0);

    engine.start(Some(frames)).await;
    assert_eq!(voice_counters.starts(), 2);
    assert_eq!(engine.sample(0).overall_score, 40);
}
