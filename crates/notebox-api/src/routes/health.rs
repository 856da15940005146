//! # Health Probes
//!
//! Mounted outside authentication.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Readiness report.
#[derive(Debug, Serialize)]
pub struct Readiness {
    pub status: &'static str,
    pub store: &'static str,
    pub chain: &'static str,
}

/// Assemble the health router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
}

/// Liveness probe. Always 200 while the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe. Reports the configured backends.
async fn readiness(State(state): State<AppState>) -> Json<Readiness> {
    let (store, chain) = state.pipeline.backends();
    Json(Readiness {
        status: "ready",
        store,
        chain,
    })
}
