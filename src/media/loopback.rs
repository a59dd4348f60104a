// In-process media transport.
//
// Behaves like a room on a media server without any network I/O: connects
// succeed for well-formed `ws://`/`wss://` URLs with a non-empty token, and
// room/track events are injected through a `LoopbackHandle`. Used by the
// binary for local runs and by the test suite.

use anyhow::{bail, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{broadcast, Notify};
use tracing::{debug, info};

use super::events::{ConnectionState, RoomEvent, TrackEvent};
use super::frames::{video_channel, VideoFrame, VideoFrameSink, VideoFrameSource};
use super::transport::MediaTransport;

const EVENT_CAPACITY: usize = 64;

struct LoopbackShared {
    name: String,
    events: broadcast::Sender<RoomEvent>,
    tracks: Mutex<HashMap<String, broadcast::Sender<TrackEvent>>>,
    video: Option<VideoFrameSink>,
    connected: AtomicBool,
    connect_attempts: AtomicUsize,
    disconnects: AtomicUsize,
    failure: Mutex<Option<String>>,
    gate: Mutex<Option<Arc<Notify>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-process media transport
pub struct LoopbackTransport {
    shared: Arc<LoopbackShared>,
}

impl LoopbackTransport {
    /// Create a loopback room with a local camera track
    pub fn new(room_name: &str) -> Self {
        Self::build(room_name, true)
    }

    /// Create a loopback room without a camera track
    pub fn without_camera(room_name: &str) -> Self {
        Self::build(room_name, false)
    }

    fn build(room_name: &str, camera: bool) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let video = camera.then(|| video_channel().0);

        Self {
            shared: Arc::new(LoopbackShared {
                name: format!("loopback:{}", room_name),
                events,
                tracks: Mutex::new(HashMap::new()),
                video,
                connected: AtomicBool::new(false),
                connect_attempts: AtomicUsize::new(0),
                disconnects: AtomicUsize::new(0),
                failure: Mutex::new(None),
                gate: Mutex::new(None),
            }),
        }
    }

    /// Handle for driving the room from outside the session
    pub fn handle(&self) -> LoopbackHandle {
        LoopbackHandle {
            shared: Arc::clone(&self.shared),
        }
    }
}

#[async_trait::async_trait]
impl MediaTransport for LoopbackTransport {
    async fn connect(&self, server_url: &str, token: &str) -> Result<()> {
        self.shared.connect_attempts.fetch_add(1, Ordering::SeqCst);
        debug!("{}: connect requested for {}", self.shared.name, server_url);

        let gate = lock(&self.shared.gate).take();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if !(server_url.starts_with("ws://") || server_url.starts_with("wss://")) {
            bail!("unsupported server URL: {}", server_url);
        }
        if token.trim().is_empty() {
            bail!("missing access token");
        }
        let failure = lock(&self.shared.failure).clone();
        if let Some(reason) = failure {
            bail!("{}", reason);
        }

        self.shared.connected.store(true, Ordering::SeqCst);
        info!("{}: connected to {}", self.shared.name, server_url);
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.shared.disconnects.fetch_add(1, Ordering::SeqCst);

        if self.shared.connected.swap(false, Ordering::SeqCst) {
            info!("{}: disconnected", self.shared.name);
            // No receivers is fine
            let _ = self
                .shared
                .events
                .send(RoomEvent::ConnectionStateChanged(ConnectionState::Disconnected));
        }

        Ok(())
    }

    fn events(&self) -> broadcast::Receiver<RoomEvent> {
        self.shared.events.subscribe()
    }

    fn track_events(&self, track_sid: &str) -> broadcast::Receiver<TrackEvent> {
        lock(&self.shared.tracks)
            .entry(track_sid.to_string())
            .or_insert_with(|| broadcast::channel(EVENT_CAPACITY).0)
            .subscribe()
    }

    fn video_frames(&self) -> Option<VideoFrameSource> {
        self.shared.video.as_ref().map(VideoFrameSink::subscribe)
    }

    fn name(&self) -> &str {
        &self.shared.name
    }
}

/// Blocks the next `connect` until released
#[derive(Clone)]
pub struct ConnectGate {
    notify: Arc<Notify>,
}

impl ConnectGate {
    pub fn release(&self) {
        self.notify.notify_one();
    }
}

/// Control handle for a [`LoopbackTransport`]
#[derive(Clone)]
pub struct LoopbackHandle {
    shared: Arc<LoopbackShared>,
}

impl LoopbackHandle {
    /// Broadcast a room event, returning how many listeners received it
    pub fn emit(&self, event: RoomEvent) -> usize {
        self.shared.events.send(event).unwrap_or(0)
    }

    /// Broadcast a mute/unmute event on one track
    pub fn emit_track(&self, track_sid: &str, event: TrackEvent) -> usize {
        lock(&self.shared.tracks)
            .get(track_sid)
            .and_then(|tx| tx.send(event).ok())
            .unwrap_or(0)
    }

    /// Make subsequent connects fail with `reason`
    pub fn fail_connects(&self, reason: &str) {
        *lock(&self.shared.failure) = Some(reason.to_string());
    }

    /// Hold the next connect until the returned gate is released
    pub fn hold_next_connect(&self) -> ConnectGate {
        let notify = Arc::new(Notify::new());
        *lock(&self.shared.gate) = Some(Arc::clone(&notify));
        ConnectGate { notify }
    }

    /// Publish a camera frame
    pub fn push_frame(&self, frame: VideoFrame) {
        if let Some(video) = &self.shared.video {
            video.push(frame);
        }
    }

    pub fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::SeqCst)
    }

    pub fn connect_attempts(&self) -> usize {
        self.shared.connect_attempts.load(Ordering::SeqCst)
    }

    pub fn disconnect_count(&self) -> usize {
        self.shared.disconnects.load(Ordering::SeqCst)
    }

    /// Number of live room event receivers
    pub fn event_receivers(&self) -> usize {
        self.shared.events.receiver_count()
    }
}
