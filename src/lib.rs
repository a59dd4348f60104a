pub mod analyzer;
pub mod config;
pub mod error;
pub mod http;
pub mod media;
pub mod metrics;
pub mod nats;
pub mod room;
pub mod session;

pub use analyzer::{
    AnalyzerFactory, AnalyzerKind, EngagementSource, EyeTrackingConfig, VoiceAnalyzerConfig,
    VoiceMetrics, VoiceMetricsSource, VoiceReading,
};
pub use config::Config;
pub use error::SessionError;
pub use http::{create_router, AppState};
pub use media::{LoopbackTransport, MediaTransport, RemoteTrack, RoomContext, RoomEvent, TrackEvent};
pub use metrics::{MetricsEngine, MetricsSnapshot, SourceStatus};
pub use nats::NatsClient;
pub use room::{ConversationRoom, PresentationState};
pub use session::{
    ConnectionStatus, Notification, NotificationKind, Notifier, SessionConfig, SessionController,
    SessionStatus,
};
