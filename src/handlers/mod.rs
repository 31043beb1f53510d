mod health;
mod interactions;
mod metrics;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::state::AppState;

pub use health::health_handler;
pub use interactions::{GENERATING_MESSAGE, UNKNOWN_COMMAND_MESSAGE, interactions_handler};
pub use metrics::metrics_handler;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/interactions", post(interactions_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}
