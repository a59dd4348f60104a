//! HTTP presentation surface
//!
//! Exposes the conversation room to a UI:
//! - GET /health - Health check
//! - GET /session/status - Connection state, duration, last error
//! - GET /session/metrics - Latest presentation state (scores, timer)
//! - POST /session/end - Stop analyzers, tear the session down

mod handlers;
mod routes;
mod server;
mod state;

pub use handlers::EndSessionResponse;
pub use routes::create_router;
pub use server::serve;
pub use state::AppState;
