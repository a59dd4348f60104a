use tracing::debug;

use crate::media::{RemoteTrack, TrackEvent, TrackKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    Subscribed,
    Unsubscribed,
}

/// Observable change produced by a track event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackTransition {
    Muted,
    Unmuted,
}

/// Health of one subscribed track
///
/// `Subscribed → (Muted ⇄ Unmuted)* → Unsubscribed`, nothing after
/// `Unsubscribed`. Lives only as long as the subscription.
#[derive(Debug, Clone)]
pub struct TrackHealth {
    sid: String,
    kind: TrackKind,
    muted: bool,
    subscription: SubscriptionState,
}

impl TrackHealth {
    pub fn subscribed(track: &RemoteTrack) -> Self {
        Self {
            sid: track.sid.clone(),
            kind: track.kind,
            muted: false,
            subscription: SubscriptionState::Subscribed,
        }
    }

    pub fn sid(&self) -> &str {
        &self.sid
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn subscription(&self) -> SubscriptionState {
        self.subscription
    }

    /// Apply a mute/unmute event
    ///
    /// Returns the transition it caused, or `None` for repeats and for any
    /// event arriving after the track was unsubscribed.
    pub fn apply(&mut self, event: TrackEvent) -> Option<TrackTransition> {
        if self.subscription == SubscriptionState::Unsubscribed {
            debug!("Ignoring {:?} on unsubscribed track {}", event, self.sid);
            return None;
        }

        match (event, self.muted) {
            (TrackEvent::Muted, false) => {
                self.muted = true;
                Some(TrackTransition::Muted)
            }
            (TrackEvent::Unmuted, true) => {
                self.muted = false;
                Some(TrackTransition::Unmuted)
            }
            _ => None,
        }
    }

    /// Mark the track unsubscribed; returns false if it already was
    pub fn unsubscribe(&mut self) -> bool {
        if self.subscription == SubscriptionState::Unsubscribed {
            return false;
        }
        self.subscription = SubscriptionState::Unsubscribed;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn audio() -> TrackHealth {
        TrackHealth::subscribed(&RemoteTrack::audio("TR_A", "agent"))
    }

    #[test]
    fn test_new_track_is_subscribed_and_unmuted() {
        let track = audio();
        assert_eq!(track.sid(), "TR_A");
        assert_eq!(track.kind(), TrackKind::Audio);
        assert!(!track.is_muted());
        assert_eq!(track.subscription(), SubscriptionState::Subscribed);
    }

    #[test]
    fn test_mute_unmute_cycle() {
        let mut track = audio();

        assert_eq!(track.apply(TrackEvent::Muted), Some(TrackTransition::Muted));
        assert!(track.is_muted());
        assert_eq!(track.apply(TrackEvent::Unmuted), Some(TrackTransition::Unmuted));
        assert_eq!(track.apply(TrackEvent::Muted), Some(TrackTransition::Muted));
    }

    #[test]
    fn test_repeated_events_are_not_transitions() {
        let mut track = audio();

        assert_eq!(track.apply(TrackEvent::Unmuted), None);
        track.apply(TrackEvent::Muted);
        assert_eq!(track.apply(TrackEvent::Muted), None);
    }

    #[test]
    fn test_no_transitions_after_unsubscribe() {
        let mut track = audio();

        assert!(track.unsubscribe());
        assert!(!track.unsubscribe());
        assert_eq!(track.apply(TrackEvent::Muted), None);
        assert!(!track.is_muted());
    }
}
