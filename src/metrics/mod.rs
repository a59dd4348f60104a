//! Multimodal metrics fusion
//!
//! [`MetricsEngine`] owns the voice and engagement analyzers and turns their
//! latest values into a [`MetricsSnapshot`] on demand.

mod engine;
mod snapshot;

pub use engine::{MetricsEngine, SourceStatus};
pub use snapshot::{eye_contact_score, overall_score, MetricsSnapshot};
