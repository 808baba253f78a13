//! Scope transition endpoint.
//!
//! The host calls this when the unit of work the queued requests
//! belong to (a displayed page) is replaced. Queued work from the old
//! scope resolves null immediately; the engine session is recycled.

use axum::extract::State;
use axum::response::Json;

use crate::state::AppState;

pub async fn begin(State(state): State<AppState>) -> Json<serde_json::Value> {
    let generation = state.translator.begin_new_scope().await;
    Json(serde_json::json!({ "generation": generation }))
}
