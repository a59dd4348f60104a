use anyhow::{Context, Result};
use serde::Deserialize;

use crate::analyzer::{EyeTrackingConfig, VoiceAnalyzerConfig};
use crate::session::SessionConfig;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub room: RoomConfig,
    pub nats: NatsConfig,
    #[serde(default)]
    pub voice: VoiceAnalyzerConfig,
    #[serde(default)]
    pub eye_tracking: EyeTrackingConfig,
    #[serde(default)]
    pub session: SessionSettings,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct RoomConfig {
    pub name: String,
    pub server_url: String,
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct NatsConfig {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct SessionSettings {
    /// How often the presentation state is sampled
    #[serde(default = "default_sample_interval_ms")]
    pub sample_interval_ms: u64,
}

fn default_sample_interval_ms() -> u64 {
    250
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            sample_interval_ms: default_sample_interval_ms(),
        }
    }
}

impl Config {
    /// Load `path` (extension optional), then apply `COMPASS__*` overrides,
    /// e.g. `COMPASS__ROOM__TOKEN`
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(
                config::Environment::with_prefix("COMPASS")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to load config from {}", path))?;

        Ok(settings.try_deserialize()?)
    }

    /// Per-session values for a new session
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::for_room(
            self.room.name.clone(),
            self.room.server_url.clone(),
            self.room.token.clone(),
        )
    }
}
