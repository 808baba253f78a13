//! Inference engine boundary.
//!
//! The scheduler only ever sees the [`InferenceEngine`] and
//! [`EngineSession`] traits; the one shipped implementation is an
//! adapter for OpenAI-compatible chat-completions endpoints
//! (llama.cpp server, Ollama, vLLM, LM Studio).

pub mod openai_compat;
pub mod traits;

pub use openai_compat::OpenAiCompatEngine;
pub use traits::{EngineSession, EngineStatus, InferenceEngine, SessionConfig};
