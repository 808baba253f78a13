//! The caller-facing facade.
//!
//! Producers call [`Translator::submit`] / [`Translator::submit_batch`]
//! from any task at any time; the only blocking they ever see is their
//! own awaited result. All engine access happens inside the single
//! worker loop (see `worker.rs`), which is started lazily and exits
//! when the queues drain.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use uuid::Uuid;

use pl_domain::config::Config;
use pl_domain::stream::BatchEvent;
use pl_engine::{EngineStatus, InferenceEngine, SessionConfig};

use crate::budget::BudgetTracker;
use crate::queue::{PendingRequest, SourceQueues};
use crate::session::{ResetReason, SessionSlot};
use crate::worker;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Shared state
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub(crate) struct Inner {
    pub queues: Mutex<SourceQueues>,
    /// Current scope. Bumped only by `begin_new_scope`.
    pub generation: AtomicU64,
    /// The one live session + budget. Locked by the worker for the
    /// duration of each engine call and by scope transitions.
    pub session: tokio::sync::Mutex<SessionSlot>,
    /// Supervised worker handle. `None` means no worker is running;
    /// the worker clears this itself, under the lock, as it exits.
    pub worker: Mutex<Option<JoinHandle<()>>>,
    pub engine: Arc<dyn InferenceEngine>,
    pub request_timeout: Duration,
    pub target_language: String,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Public surface
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// An awaitable single-request result.
///
/// `None` covers failure, timeout, empty output, and scope
/// cancellation alike; callers wanting to distinguish "not ready"
/// should consult [`Translator::status`].
pub struct PendingTranslation {
    rx: oneshot::Receiver<Option<String>>,
}

impl PendingTranslation {
    pub async fn wait(self) -> Option<String> {
        self.rx.await.ok().flatten()
    }
}

/// Snapshot of scheduler and engine state, surfaced to hosts.
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStatus {
    pub engine: EngineStatus,
    pub queue_depth: usize,
    pub active_sources: usize,
    pub generation: u64,
}

/// The translation-request scheduler.
///
/// Cheap to clone via its inner `Arc`; one instance per engine.
#[derive(Clone)]
pub struct Translator {
    pub(crate) inner: Arc<Inner>,
}

impl Translator {
    /// Build a scheduler around the given engine. Must be called from
    /// within a tokio runtime (the worker is spawned on it).
    pub fn new(engine: Arc<dyn InferenceEngine>, config: &Config) -> Self {
        let session_config = SessionConfig::from(&config.engine);
        let budget = BudgetTracker::new(config.scheduler.budget.clone());
        let inner = Arc::new(Inner {
            queues: Mutex::new(SourceQueues::new()),
            generation: AtomicU64::new(0),
            session: tokio::sync::Mutex::new(SessionSlot::new(
                engine.clone(),
                session_config,
                budget,
            )),
            worker: Mutex::new(None),
            engine,
            request_timeout: Duration::from_secs(config.scheduler.request_timeout_secs),
            target_language: config.translation.target_language.clone(),
        });
        Self { inner }
    }

    /// Queue one text for translation under a fairness source.
    ///
    /// Never blocks beyond the queue append; the translation latency
    /// is observed only through the returned future.
    pub fn submit(&self, text: impl Into<String>, source: &str) -> PendingTranslation {
        let (tx, rx) = oneshot::channel();
        let generation = self.inner.generation.load(Ordering::Acquire);
        let req = PendingRequest {
            id: Uuid::new_v4(),
            text: text.into(),
            source: source.to_string(),
            generation,
            tx,
        };
        tracing::debug!(id = %req.id, source = %req.source, generation, "request queued");
        self.inner.queues.lock().enqueue(req);
        self.ensure_worker();
        PendingTranslation { rx }
    }

    /// Queue a whole batch under one source and stream back per-index
    /// results in original order, then a terminal `Complete`.
    ///
    /// When the engine cannot service the batch at all, a single
    /// `Error` event is emitted and nothing is enqueued — the host can
    /// show a "not ready" state instead of a column of empty results.
    pub fn submit_batch(&self, texts: Vec<String>, source: &str) -> mpsc::Receiver<BatchEvent> {
        let (tx, rx) = mpsc::channel(32);

        let message = match self.inner.engine.status() {
            EngineStatus::Ready => None,
            EngineStatus::Initializing => Some("engine is still loading, please wait"),
            EngineStatus::Unavailable => Some("engine not available"),
        };
        if let Some(message) = message {
            tracing::warn!(source, message, "batch rejected");
            let message = message.to_string();
            tokio::spawn(async move {
                let _ = tx.send(BatchEvent::Error { message }).await;
            });
            return rx;
        }

        let total = texts.len();
        let pending: Vec<PendingTranslation> = texts
            .iter()
            .map(|text| self.submit(text.clone(), source))
            .collect();

        tokio::spawn(async move {
            for (index, (text, pending)) in texts.into_iter().zip(pending).enumerate() {
                let translation = pending.wait().await;
                let event = BatchEvent::Item {
                    index,
                    total,
                    text,
                    translation,
                };
                if tx.send(event).await.is_err() {
                    return; // consumer went away
                }
            }
            let _ = tx.send(BatchEvent::Complete).await;
        });
        rx
    }

    /// Tear down the current scope: bump the generation, cancel every
    /// queued request from older scopes with a `None` result, and
    /// recycle the session so no stale context leaks into the new
    /// scope. Returns the new generation.
    ///
    /// Takes the same exclusion as engine calls, so an in-flight
    /// generate is waited out rather than interrupted.
    pub async fn begin_new_scope(&self) -> u64 {
        let generation = self.inner.generation.fetch_add(1, Ordering::AcqRel) + 1;

        let stale = self.inner.queues.lock().drain_stale(generation);
        let cancelled = stale.len();
        for req in stale {
            req.resolve(None);
        }

        let mut slot = self.inner.session.lock().await;
        slot.reset(ResetReason::Scope).await;
        drop(slot);

        tracing::info!(generation, cancelled, "scope transition");
        generation
    }

    /// Current engine availability, for callers that only need to
    /// branch on readiness.
    pub fn engine_status(&self) -> EngineStatus {
        self.inner.engine.status()
    }

    /// Current engine availability and queue shape.
    pub fn status(&self) -> SchedulerStatus {
        let queues = self.inner.queues.lock();
        SchedulerStatus {
            engine: self.inner.engine.status(),
            queue_depth: queues.depth(),
            active_sources: queues.active_sources(),
            generation: self.inner.generation.load(Ordering::Acquire),
        }
    }

    /// Start the worker if none is running. Idempotent: the running
    /// worker observes new queue contents on its own; it clears the
    /// handle under the same lock as part of its exit protocol, so a
    /// concurrent enqueue either gets re-checked by the exiting worker
    /// or sees `None` here and respawns.
    fn ensure_worker(&self) {
        let mut guard = self.inner.worker.lock();
        let running = guard.as_ref().is_some_and(|h| !h.is_finished());
        if !running {
            let inner = self.inner.clone();
            *guard = Some(tokio::spawn(worker::run(inner)));
        }
    }
}
