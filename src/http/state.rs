use crate::room::ConversationRoom;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The conversation room being presented
    pub room: Arc<ConversationRoom>,

    /// Cancelled when the user ends the session over HTTP; the server shuts
    /// down once it fires
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(room: Arc<ConversationRoom>) -> Self {
        Self {
            room,
            shutdown: CancellationToken::new(),
        }
    }
}
