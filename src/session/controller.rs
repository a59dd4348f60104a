use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{error, info, warn};

use super::config::SessionConfig;
use super::handlers::{spawn_room_dispatcher, HandlerContext};
use super::listeners::{ListenerKind, ListenerRegistry};
use super::notify::{Notification, Notifier};
use super::state::{ConnectionStatus, SessionState};
use super::stats::{format_timer, SessionStatus};
use super::timer::SessionTimer;
use crate::error::SessionError;
use crate::media::{MediaTransport, RoomContext, RoomEventKind};

/// Drives one conversation session: connect, monitor, teardown
///
/// Owns the media transport for the whole session lifetime, the duration
/// timer and the event listener registry. Every task it spawns runs under the
/// session scope token, which is cancelled by `teardown` and, as a last
/// resort, when the controller is dropped.
pub struct SessionController {
    /// Session configuration
    config: SessionConfig,

    /// Media transport (the only one this session will ever use)
    transport: Arc<dyn MediaTransport>,

    notifier: Notifier,

    /// Connection state, last error
    state: Mutex<SessionState>,

    /// Whole seconds connected; written only by the timer
    duration: Arc<AtomicU64>,

    /// Cancelled on teardown; parent of every listener and the timer
    scope: CancellationToken,

    listeners: ListenerRegistry,

    handler_ctx: Arc<HandlerContext>,

    timer: Mutex<Option<SessionTimer>>,

    /// Whether the media transport has been released
    released: AtomicBool,

    created_at: DateTime<Utc>,

    _scope_guard: DropGuard,
}

impl SessionController {
    /// Create a controller in `Idle`
    pub fn new(config: SessionConfig, transport: Arc<dyn MediaTransport>, notifier: Notifier) -> Self {
        info!(
            "Creating session {} for room {} via {}",
            config.session_id,
            config.room_name,
            transport.name()
        );

        let scope = CancellationToken::new();
        let listeners = ListenerRegistry::default();
        let handler_ctx = Arc::new(HandlerContext {
            transport: Arc::clone(&transport),
            notifier: notifier.clone(),
            listeners: listeners.clone(),
            scope: scope.clone(),
        });

        Self {
            config,
            transport,
            notifier,
            state: Mutex::new(SessionState::new()),
            duration: Arc::new(AtomicU64::new(0)),
            _scope_guard: scope.clone().drop_guard(),
            scope,
            listeners,
            handler_ctx,
            timer: Mutex::new(None),
            released: AtomicBool::new(false),
            created_at: Utc::now(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Connect to the room
    ///
    /// Only valid from `Idle`. On success the session is `Connected`, listeners
    /// are registered and the duration timer runs. On failure the session is
    /// `Error` and a connection-error notification is emitted. If the session
    /// is torn down while the transport is still connecting, the outcome is
    /// discarded and `Cancelled` is returned.
    pub async fn connect(&self, server_url: &str, token: &str) -> Result<(), SessionError> {
        {
            let mut state = self.state.lock().await;
            if state.status != ConnectionStatus::Idle || self.scope.is_cancelled() {
                warn!("Connect requested while session is {}", state.status);
                return Err(SessionError::InvalidState {
                    operation: "connect",
                    state: state.status,
                });
            }
            state.status = ConnectionStatus::Connecting;
        }

        info!("Connecting session {} to {}", self.config.session_id, server_url);

        let result = self.transport.connect(server_url, token).await;

        // Teardown cancels the scope before taking this lock, so checking the
        // scope while holding it decides the race either way.
        let mut state = self.state.lock().await;

        if self.scope.is_cancelled() {
            drop(state);
            warn!("Connect resolved after teardown; discarding result");
            if result.is_ok() {
                if let Err(e) = self.transport.disconnect().await {
                    warn!("Failed to release late connection: {:#}", e);
                }
            }
            return Err(SessionError::Cancelled);
        }

        match result {
            Ok(()) => {
                state.status = ConnectionStatus::Connected;
                state.connected_at = Some(Utc::now());

                self.register_listeners().await;

                {
                    let mut timer = self.timer.lock().await;
                    *timer = Some(SessionTimer::start(
                        Arc::clone(&self.duration),
                        self.scope.child_token(),
                    ));
                }

                info!("Session {} connected", self.config.session_id);
                self.notifier.send(Notification::connected());
                Ok(())
            }
            Err(e) => {
                let reason = format!("{:#}", e);
                error!("Failed to connect to room {}: {}", self.config.room_name, reason);

                state.status = ConnectionStatus::Error;
                state.last_error = Some(reason.clone());
                self.notifier.send(Notification::connection_failed());

                Err(SessionError::ConnectionFailed(reason))
            }
        }
    }

    async fn register_listeners(&self) {
        let events = self.transport.events();
        let ctx = Arc::clone(&self.handler_ctx);
        let kinds = RoomEventKind::ALL.into_iter().map(ListenerKind::Room).collect();

        self.listeners
            .register_group(&self.scope, kinds, move |cancel| {
                spawn_room_dispatcher(ctx, events, cancel)
            })
            .await;
    }

    /// Tear the session down
    ///
    /// Cancels the timer, removes every listener, releases the media
    /// transport and moves to `Disconnected`. Safe to call repeatedly and
    /// from any state, including while `connect` is still in flight.
    pub async fn teardown(&self) {
        self.scope.cancel();

        let mut state = self.state.lock().await;
        let previous = state.status;

        let timer = self.timer.lock().await.take();
        if let Some(timer) = timer {
            timer.stop().await;
        }

        let removed = self.listeners.drain().await;

        if !self.released.swap(true, Ordering::SeqCst) {
            if let Err(e) = self.transport.disconnect().await {
                warn!("Failed to release media session: {:#}", e);
            }
        }

        state.status = ConnectionStatus::Disconnected;

        if previous != ConnectionStatus::Disconnected {
            info!(
                "Session {} torn down from {} ({} listeners removed, {}s elapsed)",
                self.config.session_id,
                previous,
                removed,
                self.duration_secs()
            );
        }
    }

    pub async fn status(&self) -> ConnectionStatus {
        self.state.lock().await.status
    }

    pub async fn last_error(&self) -> Option<String> {
        self.state.lock().await.last_error.clone()
    }

    pub fn duration_secs(&self) -> u64 {
        self.duration.load(Ordering::SeqCst)
    }

    pub fn timer_text(&self) -> String {
        format_timer(self.duration_secs())
    }

    pub async fn timer_running(&self) -> bool {
        self.timer.lock().await.is_some()
    }

    pub async fn listener_count(&self) -> usize {
        self.listeners.len().await
    }

    pub async fn listener_kinds(&self) -> Vec<ListenerKind> {
        self.listeners.kinds().await
    }

    pub fn media_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    /// Read-only handle to the live room, while connected
    pub async fn room(&self) -> Option<RoomContext> {
        if self.status().await != ConnectionStatus::Connected {
            return None;
        }

        Some(RoomContext::new(
            Arc::clone(&self.transport),
            self.config.room_name.clone(),
        ))
    }

    /// Get current session status
    pub async fn stats(&self) -> SessionStatus {
        let (state, last_error, connected_at) = {
            let state = self.state.lock().await;
            (state.status, state.last_error.clone(), state.connected_at)
        };

        SessionStatus {
            session_id: self.config.session_id.clone(),
            room_name: self.config.room_name.clone(),
            state,
            duration_secs: self.duration_secs(),
            timer_text: self.timer_text(),
            last_error,
            created_at: self.created_at,
            connected_at,
            listener_count: self.listener_count().await,
        }
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        if !self.released.load(Ordering::SeqCst) {
            warn!(
                "Session {} dropped without teardown; media session was not released",
                self.config.session_id
            );
        }
    }
}
