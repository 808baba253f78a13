//! HTTP API surface.
//!
//! - `POST /v1/translate`       — single text, waits for the result
//! - `POST /v1/translate/batch` — SSE stream of per-index results
//! - `POST /v1/scope`           — scope transition (page replaced)
//! - `GET  /v1/status`          — engine availability + queue shape

pub mod scope;
pub mod status;
pub mod translate;

use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    // Browser pages on this machine are the expected callers.
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(|origin: &HeaderValue, _| {
            let origin = origin.as_bytes();
            origin.starts_with(b"http://localhost")
                || origin.starts_with(b"http://127.0.0.1")
        }))
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    Router::new()
        .route("/v1/translate", post(translate::translate))
        .route("/v1/translate/batch", post(translate::translate_batch))
        .route("/v1/scope", post(scope::begin))
        .route("/v1/status", get(status::status))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
