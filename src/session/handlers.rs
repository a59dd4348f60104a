// Room and track event handlers.
//
// Handlers only log and notify; none of them changes the connection state.
// Reconnection is the transport's job and shows up here only as events.

use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::listeners::{ListenerKind, ListenerRegistry};
use super::notify::{Notification, Notifier};
use super::track::{TrackHealth, TrackTransition};
use crate::error::SessionError;
use crate::media::{ConnectionState, MediaTransport, RemoteTrack, RoomEvent, TrackEvent, TrackKind};

/// Everything a handler may touch
pub(crate) struct HandlerContext {
    pub transport: Arc<dyn MediaTransport>,
    pub notifier: Notifier,
    pub listeners: ListenerRegistry,
    pub scope: CancellationToken,
}

/// Spawn the session's room event dispatcher
///
/// One receiver, one task: each event's handler runs to completion before the
/// next event is taken, so a track's unsubscribe can never overtake its
/// subscribe.
pub(crate) fn spawn_room_dispatcher(
    ctx: Arc<HandlerContext>,
    mut events: broadcast::Receiver<RoomEvent>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                received = events.recv() => match received {
                    Ok(event) => handle_room_event(&ctx, event).await,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Room event dispatcher lagged, skipped {} events", skipped);
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }

        debug!("Room event dispatcher stopped");
    })
}

async fn handle_room_event(ctx: &Arc<HandlerContext>, event: RoomEvent) {
    match event {
        RoomEvent::TrackSubscribed(track) => on_track_subscribed(ctx, track).await,
        RoomEvent::TrackUnsubscribed(track) => on_track_unsubscribed(ctx, track).await,
        RoomEvent::ParticipantConnected { identity } => {
            info!("Participant connected: {}", identity);
        }
        RoomEvent::ParticipantDisconnected { identity } => {
            info!("Participant disconnected: {}", identity);
        }
        RoomEvent::ConnectionStateChanged(state) => on_connection_state_changed(ctx, state),
    }
}

async fn on_track_subscribed(ctx: &Arc<HandlerContext>, track: RemoteTrack) {
    info!("Track subscribed: {:?} {} from {}", track.kind, track.sid, track.participant);

    if track.kind != TrackKind::Audio {
        return;
    }

    // Subscribe before any await so no mute event slips past the observer
    let events = ctx.transport.track_events(&track.sid);
    let notifier = ctx.notifier.clone();
    let kind = ListenerKind::TrackMute {
        track_sid: track.sid.clone(),
    };

    ctx.listeners
        .register(&ctx.scope, kind, move |cancel| {
            spawn_track_observer(notifier, track, events, cancel)
        })
        .await;
}

async fn on_track_unsubscribed(ctx: &Arc<HandlerContext>, track: RemoteTrack) {
    info!("Track unsubscribed: {:?} {} from {}", track.kind, track.sid, track.participant);

    if track.kind != TrackKind::Audio {
        return;
    }

    let degraded = SessionError::TrackDegraded(format!(
        "audio track {} from {} unsubscribed",
        track.sid, track.participant
    ));
    warn!("{}", degraded);

    ctx.listeners.remove_track(&track.sid).await;
    ctx.notifier.send(Notification::track_degraded());
}

fn on_connection_state_changed(ctx: &HandlerContext, state: ConnectionState) {
    info!("Connection state changed: {:?}", state);

    if state == ConnectionState::Disconnected {
        warn!("Lost connection to the room; waiting for transport to reconnect");
        ctx.notifier.send(Notification::connection_lost());
    }
}

/// Watch mute/unmute on one audio track
fn spawn_track_observer(
    notifier: Notifier,
    track: RemoteTrack,
    mut events: broadcast::Receiver<TrackEvent>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut health = TrackHealth::subscribed(&track);

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                received = events.recv() => match received {
                    Ok(event) => match health.apply(event) {
                        Some(TrackTransition::Muted) => {
                            warn!("Audio track {} muted", health.sid());
                            notifier.send(Notification::track_muted());
                        }
                        Some(TrackTransition::Unmuted) => {
                            info!("Audio track {} unmuted", health.sid());
                        }
                        None => {}
                    },
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Track {} observer lagged, skipped {} events", health.sid(), skipped);
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }

        health.unsubscribe();
        debug!("Track {} observer stopped", health.sid());
    })
}
