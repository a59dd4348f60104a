// Event listener registry.
//
// Each registration is a handler task plus the event kinds it serves. All room
// event kinds share one dispatcher task so events are handled in arrival
// order; each mute observer is its own entry. Handler tasks run under a child
// of the session scope token, so cancelling the scope stops every handler;
// `drain` then removes and joins them in one loop.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::media::RoomEventKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListenerKind {
    Room(RoomEventKind),
    TrackMute { track_sid: String },
}

struct Listener {
    kinds: Vec<ListenerKind>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

#[derive(Clone, Default)]
pub(crate) struct ListenerRegistry {
    listeners: Arc<Mutex<Vec<Listener>>>,
}

impl ListenerRegistry {
    /// Register a listener unless `scope` is already cancelled
    ///
    /// `spawn` receives the listener's own cancellation token and returns the
    /// handler task. The scope check and the insert happen under the registry
    /// lock, so nothing is registered once teardown has started draining.
    pub async fn register<F>(&self, scope: &CancellationToken, kind: ListenerKind, spawn: F) -> bool
    where
        F: FnOnce(CancellationToken) -> JoinHandle<()>,
    {
        self.register_group(scope, vec![kind], spawn).await
    }

    /// Register one handler task serving several event kinds
    ///
    /// Each kind counts as its own entry in `len` and `kinds`.
    pub async fn register_group<F>(
        &self,
        scope: &CancellationToken,
        kinds: Vec<ListenerKind>,
        spawn: F,
    ) -> bool
    where
        F: FnOnce(CancellationToken) -> JoinHandle<()>,
    {
        let mut listeners = self.listeners.lock().await;

        if scope.is_cancelled() {
            debug!("Skipping {:?} listener: session scope closed", kinds);
            return false;
        }

        let cancel = scope.child_token();
        let task = spawn(cancel.clone());
        debug!("Registered {:?} listener", kinds);
        listeners.push(Listener { kinds, cancel, task });
        true
    }

    /// Remove the mute observer of one track
    pub async fn remove_track(&self, track_sid: &str) -> bool {
        let removed = {
            let mut listeners = self.listeners.lock().await;
            let position = listeners.iter().position(|l| {
                l.kinds.iter().any(|kind| {
                    matches!(kind, ListenerKind::TrackMute { track_sid: sid } if sid == track_sid)
                })
            });
            position.map(|i| listeners.swap_remove(i))
        };

        match removed {
            Some(listener) => {
                Self::stop(listener).await;
                true
            }
            None => false,
        }
    }

    /// Cancel and join every listener, leaving the registry empty
    ///
    /// Returns the number of (kind, handler) entries removed.
    pub async fn drain(&self) -> usize {
        let drained = std::mem::take(&mut *self.listeners.lock().await);
        let count = drained.iter().map(|l| l.kinds.len()).sum();

        for listener in drained {
            Self::stop(listener).await;
        }

        count
    }

    pub async fn len(&self) -> usize {
        self.listeners
            .lock()
            .await
            .iter()
            .map(|l| l.kinds.len())
            .sum()
    }

    pub async fn kinds(&self) -> Vec<ListenerKind> {
        self.listeners
            .lock()
            .await
            .iter()
            .flat_map(|l| l.kinds.iter().cloned())
            .collect()
    }

    async fn stop(listener: Listener) {
        listener.cancel.cancel();
        if let Err(e) = listener.task.await {
            error!("{:?} listener panicked: {}", listener.kinds, e);
        }
    }
}
