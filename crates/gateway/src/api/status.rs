//! Status endpoint — lets hosts distinguish "will be serviced once
//! ready" from "will never be serviced".

use axum::extract::State;
use axum::response::Json;

use pl_scheduler::SchedulerStatus;

use crate::state::AppState;

pub async fn status(State(state): State<AppState>) -> Json<SchedulerStatus> {
    Json(state.translator.status())
}
