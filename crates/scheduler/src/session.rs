//! The managed session slot.
//!
//! Owns the one live engine session handle plus its budget counters.
//! The slot is guarded by a single `tokio::sync::Mutex` in the
//! translator; only the worker loop and scope transitions ever lock
//! it, which is the whole exclusion story for the non-reentrant
//! engine.

use std::sync::Arc;

use pl_domain::error::{Error, Result};
use pl_engine::{EngineSession, InferenceEngine, SessionConfig};

use crate::budget::BudgetTracker;

/// Why the session is being recycled.
#[derive(Debug, Clone, Copy)]
pub(crate) enum ResetReason {
    /// A budget ceiling would be crossed by the next request.
    Budget,
    /// The scope that issued the queued work was torn down.
    Scope,
    /// The engine failed mid-call; its internal state is suspect.
    EngineError,
}

impl std::fmt::Display for ResetReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Budget => write!(f, "budget ceiling"),
            Self::Scope => write!(f, "scope transition"),
            Self::EngineError => write!(f, "engine error"),
        }
    }
}

pub(crate) struct SessionSlot {
    engine: Arc<dyn InferenceEngine>,
    config: SessionConfig,
    handle: Option<Box<dyn EngineSession>>,
    pub budget: BudgetTracker,
}

impl SessionSlot {
    pub fn new(
        engine: Arc<dyn InferenceEngine>,
        config: SessionConfig,
        budget: BudgetTracker,
    ) -> Self {
        Self {
            engine,
            config,
            handle: None,
            budget,
        }
    }

    /// Run one prompt through the session, creating it lazily.
    pub async fn generate(&mut self, prompt: &str) -> Result<String> {
        if self.handle.is_none() {
            let session = self.engine.create_session(&self.config).await?;
            tracing::info!("created fresh engine session");
            self.handle = Some(session);
        }
        match self.handle.as_mut() {
            Some(handle) => handle.generate(prompt).await,
            None => Err(Error::Engine("session slot empty after create".into())),
        }
    }

    /// Close the current session (if any) and zero the budget. The
    /// next `generate` call recreates the session with the same
    /// configuration.
    pub async fn reset(&mut self, reason: ResetReason) {
        if let Some(mut handle) = self.handle.take() {
            handle.close().await;
        }
        self.budget.clear();
        tracing::info!(%reason, "engine session recycled");
    }
}
