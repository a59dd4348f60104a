//! Conversation session management
//!
//! This module provides the `SessionController` abstraction that manages:
//! - Connecting to the media transport and the connection state machine
//! - Room and track event listeners (mute, track loss, connection loss)
//! - User-facing notifications
//! - The session duration timer
//! - Teardown of everything above, from any state

mod config;
mod controller;
mod handlers;
mod listeners;
mod notify;
mod state;
mod stats;
mod timer;
mod track;

pub use config::SessionConfig;
pub use controller::SessionController;
pub use listeners::ListenerKind;
pub use notify::{Notification, NotificationKind, Notifier, Severity};
pub use state::ConnectionStatus;
pub use stats::{format_timer, SessionStatus};
pub use timer::TIMER_PERIOD;
pub use track::{SubscriptionState, TrackHealth, TrackTransition};
