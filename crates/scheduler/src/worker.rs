//! The single serialized consumer.
//!
//! At most one worker runs at a time. It drains the round-robin
//! scheduler until empty, then exits; the next enqueue restarts it.
//! Every engine call happens here, under the session mutex, bounded by
//! the per-request timeout. No failure aborts the loop — each request
//! resolves on its own and the loop moves on.

use std::sync::Arc;
use std::time::Duration;

use pl_engine::EngineStatus;

use crate::budget::BudgetTracker;
use crate::prompt::build_prompt;
use crate::queue::PendingRequest;
use crate::session::ResetReason;
use crate::translator::Inner;

/// Cadence for re-checking a still-initializing engine.
const INIT_POLL: Duration = Duration::from_millis(250);

pub(crate) async fn run(inner: Arc<Inner>) {
    loop {
        let popped = inner.queues.lock().next();
        match popped {
            Some(req) => service_one(&inner, req).await,
            None => {
                // Exit protocol: decide under the supervisor lock and
                // re-check the queue so an enqueue racing with this
                // exit is either observed here or respawns the worker.
                let mut guard = inner.worker.lock();
                if inner.queues.lock().is_empty() {
                    *guard = None;
                    return;
                }
            }
        }
    }
}

async fn service_one(inner: &Arc<Inner>, req: PendingRequest) {
    // Stale at dequeue: resolve without consuming a session turn.
    if is_stale(inner, &req) {
        tracing::debug!(id = %req.id, "request from old scope, cancelled");
        req.resolve(None);
        return;
    }

    // Hold the request while the engine loads; it will be serviced
    // once ready. A terminal failure resolves it instead.
    loop {
        match inner.engine.status() {
            EngineStatus::Ready => break,
            EngineStatus::Unavailable => {
                tracing::warn!(id = %req.id, "engine unavailable, dropping request");
                req.resolve(None);
                return;
            }
            EngineStatus::Initializing => {
                if is_stale(inner, &req) {
                    req.resolve(None);
                    return;
                }
                tokio::time::sleep(INIT_POLL).await;
            }
        }
    }
    if is_stale(inner, &req) {
        req.resolve(None);
        return;
    }

    let dequeued_generation = req.generation;
    let prompt = build_prompt(&req.text, &inner.target_language);
    let cost = BudgetTracker::estimate(&req.text);

    let mut slot = inner.session.lock().await;
    // A scope transition may have bumped the generation, drained the
    // queues, and recycled the session while we waited for the lock;
    // old-scope text must not enter the fresh session.
    if is_stale(inner, &req) {
        drop(slot);
        tracing::debug!(id = %req.id, "scope turned over while awaiting session, cancelled");
        req.resolve(None);
        return;
    }
    if slot.budget.reset_due(cost) {
        slot.reset(ResetReason::Budget).await;
    }

    let outcome = tokio::time::timeout(inner.request_timeout, slot.generate(&prompt)).await;
    let result = match outcome {
        Ok(Ok(text)) => {
            slot.budget.charge(cost);
            let trimmed = text.trim();
            if trimmed.is_empty() {
                tracing::debug!(id = %req.id, "engine returned empty result");
                None
            } else {
                tracing::debug!(id = %req.id, chars = trimmed.len(), "request served");
                Some(trimmed.to_string())
            }
        }
        Ok(Err(err)) => {
            // Engine exceptions are the primary signal that the
            // session's internal state is corrupted.
            tracing::warn!(id = %req.id, error = %err, "engine call failed");
            slot.reset(ResetReason::EngineError).await;
            None
        }
        Err(_elapsed) => {
            // The engine may have consumed context anyway; charge the
            // estimate and keep going.
            tracing::warn!(
                id = %req.id,
                timeout_secs = inner.request_timeout.as_secs(),
                "engine call timed out"
            );
            slot.budget.charge(cost);
            None
        }
    };
    drop(slot);

    // A scope transition during the call discards the result; the
    // turn itself was already accounted for.
    let now = inner.generation.load(std::sync::atomic::Ordering::Acquire);
    if now > dequeued_generation {
        req.resolve(None);
    } else {
        req.resolve(result);
    }
}

fn is_stale(inner: &Inner, req: &PendingRequest) -> bool {
    req.generation < inner.generation.load(std::sync::atomic::Ordering::Acquire)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::sync::oneshot;
    use uuid::Uuid;

    use pl_domain::config::Config;
    use pl_domain::error::Result;
    use pl_engine::{EngineSession, InferenceEngine, SessionConfig};

    use super::*;
    use crate::translator::Translator;

    /// Counts sessions so a test can assert the engine was never
    /// touched.
    struct CountingEngine {
        sessions: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl InferenceEngine for CountingEngine {
        fn status(&self) -> EngineStatus {
            EngineStatus::Ready
        }

        async fn create_session(&self, _config: &SessionConfig) -> Result<Box<dyn EngineSession>> {
            self.sessions.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(NoopSession))
        }
    }

    struct NoopSession;

    #[async_trait::async_trait]
    impl EngineSession for NoopSession {
        async fn generate(&mut self, _prompt: &str) -> Result<String> {
            Ok("x".into())
        }

        async fn close(&mut self) {}
    }

    /// A request that passed the dequeue-time checks but loses the
    /// race for the session mutex to a scope transition is cancelled
    /// without an engine call.
    #[tokio::test]
    async fn request_stale_after_lock_wait_is_not_serviced() {
        let engine = Arc::new(CountingEngine {
            sessions: AtomicUsize::new(0),
        });
        let translator = Translator::new(engine.clone(), &Config::default());
        let inner = translator.inner.clone();

        let (tx, rx) = oneshot::channel();
        let req = PendingRequest {
            id: Uuid::new_v4(),
            text: "old scope text".into(),
            source: "A".into(),
            generation: 0,
            tx,
        };

        // Park the service path on the session mutex.
        let guard = inner.session.lock().await;
        let service = tokio::spawn({
            let inner = inner.clone();
            async move { service_one(&inner, req).await }
        });
        tokio::task::yield_now().await;

        // Scope turns over while the service task is still waiting.
        inner.generation.store(1, std::sync::atomic::Ordering::Release);
        drop(guard);

        service.await.unwrap();
        assert_eq!(rx.await.unwrap(), None);
        assert_eq!(engine.sessions.load(Ordering::SeqCst), 0);
    }
}
