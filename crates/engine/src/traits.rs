use pl_domain::config::EngineConfig;
use pl_domain::error::Result;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session configuration
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Sampling parameters and the per-response token ceiling for one
/// engine session. Recreating a session after a budget reset reuses
/// the same config.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub model: String,
    pub max_tokens: u32,
    pub top_k: Option<u32>,
    pub top_p: Option<f32>,
    pub temperature: Option<f32>,
}

impl From<&EngineConfig> for SessionConfig {
    fn from(cfg: &EngineConfig) -> Self {
        Self {
            model: cfg.model.clone(),
            max_tokens: cfg.max_tokens,
            top_k: cfg.top_k,
            top_p: cfg.top_p,
            temperature: cfg.temperature,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Availability
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Engine availability as reported upward through the scheduler.
///
/// `Initializing` means queued work will be serviced once the model is
/// loaded; `Unavailable` means it never will be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    Initializing,
    Ready,
    Unavailable,
}

impl EngineStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initializing => "initializing",
            Self::Ready => "ready",
            Self::Unavailable => "unavailable",
        }
    }
}

impl serde::Serialize for EngineStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Core traits
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A factory for engine sessions plus the availability signal.
///
/// Implementations must tolerate `create_session` being called again
/// after earlier sessions were closed — that is the normal recycle
/// path, not an edge case.
#[async_trait::async_trait]
pub trait InferenceEngine: Send + Sync {
    /// Current availability. Cheap; polled by the worker loop.
    fn status(&self) -> EngineStatus;

    /// Open a fresh conversation session.
    async fn create_session(&self, config: &SessionConfig) -> Result<Box<dyn EngineSession>>;
}

/// One ongoing conversation with the engine.
///
/// Not reentrant: `generate` takes `&mut self` and every call appends
/// to the session's accumulated context. The scheduler funnels all
/// calls through a single worker, so no implementation needs internal
/// locking.
#[async_trait::async_trait]
pub trait EngineSession: Send {
    /// Submit one prompt and wait for the full completion.
    async fn generate(&mut self, prompt: &str) -> Result<String>;

    /// Release the session's resources. Idempotent.
    async fn close(&mut self);
}
