use super::{create_router, AppState};
use anyhow::{Context, Result};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Serve the HTTP surface until the session ends
///
/// Runs the score sampler alongside the server. Whatever way the server
/// stops (session ended over HTTP, shutdown token cancelled, bind or serve
/// failure) the sampler is joined and the room is torn down before the
/// server's result is returned.
pub async fn serve(state: AppState, addr: &str, sample_interval: Duration) -> Result<()> {
    let sampler = spawn_sampler(&state, sample_interval);

    let result = run_server(&state, addr).await;
    if let Err(e) = &result {
        warn!("HTTP server stopped with error: {:#}", e);
    }

    state.shutdown.cancel();
    if let Err(e) = sampler.await {
        warn!("Sampler task panicked: {}", e);
    }
    state.room.on_end().await;

    result
}

async fn run_server(state: &AppState, addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind HTTP server to {}", addr))?;
    info!("HTTP server listening on {}", listener.local_addr()?);

    let signal = state.shutdown.clone();
    axum::serve(listener, create_router(state.clone()))
        .with_graceful_shutdown(async move {
            signal.cancelled().await;
            info!("Session ended, shutting down");
        })
        .await
        .context("HTTP server failed")
}

/// Log the overall score whenever it changes
fn spawn_sampler(state: &AppState, period: Duration) -> JoinHandle<()> {
    let room = state.room.clone();
    let shutdown = state.shutdown.clone();
    let period = period.max(Duration::from_millis(1));

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        let mut last_score = None;

        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let view = room.render().await;
                    if last_score != Some(view.overall_score) {
                        debug!(
                            "[{}] overall {} (eye contact {:.1}, audio {:.1})",
                            view.session_timer_text,
                            view.overall_score,
                            view.eye_contact_score,
                            view.audio_level
                        );
                        last_score = Some(view.overall_score);
                    }
                }
            }
        }
    })
}
