pub mod eye;
pub mod source;
pub mod voice;

pub use eye::NatsEngagementAnalyzer;
pub use source::{
    AnalyzerFactory, AnalyzerKind, EngagementSource, EyeTrackingConfig, VoiceAnalyzerConfig,
    VoiceMetrics, VoiceMetricsSource, VoiceReading,
};
pub use voice::NatsVoiceAnalyzer;
