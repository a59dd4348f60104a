mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{SourceCounters, StaticEngagementSource, StaticVoiceSource, SERVER_URL, TOKEN};
use confidence_compass::http::{self, EndSessionResponse};
use confidence_compass::{
    create_router, AppState, ConnectionStatus, ConversationRoom, LoopbackTransport, Notifier,
    SessionConfig, SessionStatus,
};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

async fn joined_state() -> AppState {
    joined_state_with_voice().await.0
}

async fn joined_state_with_voice() -> (AppState, SourceCounters) {
    let (voice, voice_counters) = StaticVoiceSource::new(40.0);
    let (engagement, _) = StaticEngagementSource::new(0.6);
    let (notifier, _rx) = Notifier::channel();

    let room = ConversationRoom::new(
        SessionConfig::for_room("practice", SERVER_URL, TOKEN),
        Arc::new(LoopbackTransport::new("practice")),
        Box::new(voice),
        Box::new(engagement),
        notifier,
    );
    room.join().await.unwrap();

    (AppState::new(Arc::new(room)), voice_counters)
}

async fn send(state: &AppState, method: &str, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = create_router(state.clone())
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

#[tokio::test]
async fn test_health_check() {
    let state = joined_state().await;

    let (status, body) = send(&state, "GET", "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");

    state.room.on_end().await;
}

#[tokio::test]
async fn test_session_status() {
    let state = joined_state().await;

    let (status, body) = send(&state, "GET", "/session/status").await;
    assert_eq!(status, StatusCode::OK);

    let stats: SessionStatus = serde_json::from_slice(&body).unwrap();
    assert_eq!(stats.state, ConnectionStatus::Connected);
    assert_eq!(stats.room_name, "practice");
    assert_eq!(stats.listener_count, 5);

    state.room.on_end().await;
}

#[tokio::test]
async fn test_session_metrics() {
    let state = joined_state().await;

    let (status, body) = send(&state, "GET", "/session/metrics").await;
    assert_eq!(status, StatusCode::OK);

    let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["overall_score"], 50);
    assert_eq!(value["eye_contact_score"], 60.0);
    assert_eq!(value["is_active"], true);
    assert_eq!(value["connection"], "connected");
    assert_eq!(value["session_timer_text"], "00:00");

    state.room.on_end().await;
}

#[tokio::test]
async fn test_end_session_tears_down_and_signals_shutdown() {
    let state = joined_state().await;
    assert!(!state.shutdown.is_cancelled());

    let (status, body) = send(&state, "POST", "/session/end").await;
    assert_eq!(status, StatusCode::OK);

    let ended: EndSessionResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(ended.status, "disconnected");
    assert_eq!(ended.stats.listener_count, 0);

    assert!(state.shutdown.is_cancelled());
    assert_eq!(state.room.status().await, ConnectionStatus::Disconnected);
    assert!(state.room.controller().media_released());

    let (_, body) = send(&state, "GET", "/session/metrics").await;
    let view: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(view["is_active"], false);
    assert_eq!(view["overall_score"], 0);
}

#[tokio::test]
async fn test_end_session_rejects_get() {
    let state = joined_state().await;

    let (status, _) = send(&state, "GET", "/session/end").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert!(!state.shutdown.is_cancelled());

    state.room.on_end().await;
}

#[tokio::test]
async fn test_serve_tears_down_when_bind_fails() {
    let (state, voice) = joined_state_with_voice().await;
    let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = taken.local_addr().unwrap().to_string();

    let result = http::serve(state.clone(), &addr, Duration::from_millis(10)).await;

    assert!(result.is_err());
    assert!(state.shutdown.is_cancelled());
    assert_eq!(state.room.status().await, ConnectionStatus::Disconnected);
    assert!(state.room.controller().media_released());
    assert_eq!(voice.stops(), 1);
}

#[tokio::test]
async fn test_serve_tears_down_on_shutdown() {
    let (state, voice) = joined_state_with_voice().await;

    let server = {
        let state = state.clone();
        tokio::spawn(
            async move { http::serve(state, "127.0.0.1:0", Duration::from_millis(10)).await },
        )
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    state.shutdown.cancel();

    let result = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .unwrap()
        .unwrap();

    assert!(result.is_ok());
    assert_eq!(state.room.status().await, ConnectionStatus::Disconnected);
    assert!(state.room.controller().media_released());
    assert_eq!(voice.stops(), 1);
}
