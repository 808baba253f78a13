//! Translation endpoints — the primary interface for page scripts.
//!
//! - `POST /v1/translate`       — non-streaming: waits for the one result
//! - `POST /v1/translate/batch` — SSE: per-index results + terminal signal

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Json};
use futures_util::stream::Stream;
use serde::Deserialize;

use pl_domain::stream::BatchEvent;
use pl_engine::EngineStatus;

use crate::state::AppState;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Request shapes
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
pub struct TranslateRequest {
    /// Text to translate.
    pub text: String,
    /// Fairness source; independent page contexts should use distinct
    /// values (e.g. "page-script", "image-ocr", "captions").
    #[serde(default = "d_source")]
    pub source: String,
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub texts: Vec<String>,
    #[serde(default = "d_source")]
    pub source: String,
}

fn d_source() -> String {
    "default".into()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /v1/translate (non-streaming)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn translate(
    State(state): State<AppState>,
    Json(body): Json<TranslateRequest>,
) -> impl IntoResponse {
    // Pre-flight: reject early with 503 when the engine is gone for
    // good. A still-loading engine accepts the request; it is serviced
    // once the model is up.
    if state.translator.engine_status() == EngineStatus::Unavailable {
        return (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "error": "engine not available" })),
        )
            .into_response();
    }

    let pending = state.translator.submit(body.text, &body.source);
    let translation = pending.wait().await;
    Json(serde_json::json!({ "translation": translation })).into_response()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /v1/translate/batch (SSE)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn translate_batch(
    State(state): State<AppState>,
    Json(body): Json<BatchRequest>,
) -> impl IntoResponse {
    // A not-ready engine yields a single SSE error event from the
    // scheduler's own pre-flight; no special casing needed here.
    let rx = state.translator.submit_batch(body.texts, &body.source);
    Sse::new(make_sse_stream(rx))
        .keep_alive(KeepAlive::default())
        .into_response()
}

fn make_sse_stream(
    mut rx: tokio::sync::mpsc::Receiver<BatchEvent>,
) -> impl Stream<Item = Result<Event, std::convert::Infallible>> {
    async_stream::stream! {
        while let Some(event) = rx.recv().await {
            let event_type = match &event {
                BatchEvent::Item { .. } => "result",
                BatchEvent::Complete => "complete",
                BatchEvent::Error { .. } => "error",
            };
            let data = serde_json::to_string(&event).unwrap_or_default();
            yield Ok(Event::default().event(event_type).data(data));
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translate_request_defaults_source() {
        let req: TranslateRequest = serde_json::from_str(r#"{ "text": "hola" }"#).unwrap();
        assert_eq!(req.text, "hola");
        assert_eq!(req.source, "default");
    }

    #[test]
    fn batch_request_parses_texts_and_source() {
        let req: BatchRequest =
            serde_json::from_str(r#"{ "texts": ["a", "b"], "source": "captions" }"#).unwrap();
        assert_eq!(req.texts.len(), 2);
        assert_eq!(req.source, "captions");
    }
}
