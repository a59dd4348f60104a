use anyhow::Result;
use clap::Parser;
use confidence_compass::session::Severity;
use confidence_compass::{
    http, AnalyzerFactory, AppState, Config, ConversationRoom, LoopbackTransport, Notifier,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "confidence-compass", version, about = "Live conversation engagement coach")]
struct Args {
    /// Config file, extension optional
    #[arg(long, default_value = "config/confidence-compass")]
    config: String,

    /// Media server URL (overrides config)
    #[arg(long)]
    server_url: Option<String>,

    /// Room access token (overrides config)
    #[arg(long)]
    token: Option<String>,

    /// Room name (overrides config)
    #[arg(long)]
    room: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("Confidence Compass v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);

    let mut session = cfg.session_config();
    if let Some(room) = args.room {
        session.room_name = room;
    }
    if let Some(url) = args.server_url {
        session.server_url = url;
    }
    if let Some(token) = args.token {
        session.token = token;
    }

    let (notifier, mut notifications) = Notifier::channel();
    tokio::spawn(async move {
        while let Some(n) = notifications.recv().await {
            match n.severity {
                Severity::Info => info!("[{}] {}", n.title, n.description),
                Severity::Warning => warn!("[{}] {}", n.title, n.description),
                Severity::Destructive => error!("[{}] {}", n.title, n.description),
            }
        }
    });

    let transport = Arc::new(LoopbackTransport::new(&session.room_name));
    let voice = AnalyzerFactory::voice(&cfg.nats.url, &session.session_id, cfg.voice.clone());
    let engagement =
        AnalyzerFactory::engagement(&cfg.nats.url, &session.session_id, cfg.eye_tracking.clone());

    let room = Arc::new(ConversationRoom::new(
        session, transport, voice, engagement, notifier,
    ));

    // A failed join leaves the room in its error state; the HTTP surface
    // still serves it so the user can end the session.
    if let Err(e) = room.join().await {
        error!("Failed to join conversation room: {}", e);
    }

    let state = AppState::new(room);
    let shutdown = state.shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl-C received, shutting down");
                shutdown.cancel();
            }
            Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
        }
    });

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let period = Duration::from_millis(cfg.session.sample_interval_ms);
    let result = http::serve(state, &addr, period).await;
    info!("Goodbye");

    result
}
