//! Session error taxonomy.

use thiserror::Error;

use crate::analyzer::AnalyzerKind;
use crate::session::ConnectionStatus;

/// Errors surfaced by the session controller and metrics engine
///
/// Transport and analyzer failures are converted into these at the component
/// boundary; raw transport errors never escape.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    /// The transport rejected the connect (network, auth, unknown room)
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// An audio track was lost; the transport may recover it
    #[error("Audio track degraded: {0}")]
    TrackDegraded(String),

    /// Capture device could not be acquired by an analyzer
    #[error("{} unavailable: {reason}", .analyzer.device())]
    DeviceUnavailable {
        analyzer: AnalyzerKind,
        reason: String,
    },

    /// Operation not valid in the current connection state
    #[error("Cannot {operation} while session is {state}")]
    InvalidState {
        operation: &'static str,
        state: ConnectionStatus,
    },

    /// The session was torn down before the connect attempt resolved
    #[error("Connect attempt abandoned: session was torn down")]
    Cancelled,
}
