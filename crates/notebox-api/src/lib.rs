//! # notebox-api — HTTP Surface
//!
//! Axum router over the [`DocumentPipeline`](notebox_pipeline::DocumentPipeline):
//!
//! | Route                                 | Session  | Response             |
//! |---------------------------------------|----------|----------------------|
//! | `POST /v1/notes`                      | required | `{"id", "tokenId"}`  |
//! | `GET /v1/notes/{id}?action=preview`   | none     | `application/pdf`    |
//! | `GET /v1/notes/{id}?action=download`  | required | `application/pdf`    |
//! | `POST /v1/notes/{id}/purchase`        | required | purchase receipt     |
//! | `GET /health/liveness`                | none     | `ok`                 |
//! | `GET /health/readiness`               | none     | backend report       |
//!
//! ## Crate Policy
//!
//! - Handlers never construct status codes directly; failures go through
//!   [`AppError`].
//! - Internal and upstream error messages are logged and never returned.
//! - Request bodies are capped at [`BODY_LIMIT_BYTES`].

pub mod auth;
pub mod error;
pub mod routes;
pub mod state;

pub use error::AppError;
pub use state::{AppConfig, AppState};

use axum::extract::DefaultBodyLimit;
use axum::Router;
use notebox_pipeline::MAX_UPLOAD_BYTES;
use tower_http::trace::TraceLayer;

/// Request body cap: one maximum-size upload plus multipart framing.
pub const BODY_LIMIT_BYTES: usize = MAX_UPLOAD_BYTES + 64 * 1024;

/// Assemble the full application router.
pub fn app(state: AppState) -> Router {
    let api = routes::notes::router()
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(TraceLayer::new_for_http());

    Router::new()
        .merge(routes::health::router())
        .merge(api)
        .with_state(state)
}
