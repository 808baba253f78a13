use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub translation: TranslationConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// HTTP server
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "d_host")]
    pub host: String,
    #[serde(default = "d_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: d_host(),
            port: d_port(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Inference engine endpoint
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Connection and sampling settings for the local inference engine.
///
/// The adapter speaks the OpenAI chat-completions wire format, which
/// llama.cpp server, Ollama, vLLM and LM Studio all accept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "d_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "d_model")]
    pub model: String,
    /// Per-response token ceiling passed to the engine.
    #[serde(default = "d_512")]
    pub max_tokens: u32,
    #[serde(default = "d_top_k")]
    pub top_k: Option<u32>,
    #[serde(default = "d_top_p")]
    pub top_p: Option<f32>,
    #[serde(default = "d_temperature")]
    pub temperature: Option<f32>,
    /// Readiness probe cadence while the engine is loading its model.
    #[serde(default = "d_probe_interval")]
    pub probe_interval_ms: u64,
    /// Probe attempts before the engine is declared unavailable.
    #[serde(default = "d_probe_attempts")]
    pub probe_attempts: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: d_base_url(),
            api_key: None,
            model: d_model(),
            max_tokens: d_512(),
            top_k: d_top_k(),
            top_p: d_top_p(),
            temperature: d_temperature(),
            probe_interval_ms: d_probe_interval(),
            probe_attempts: d_probe_attempts(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Scheduler & session budget
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Per-request engine call timeout, in seconds.
    #[serde(default = "d_30")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub budget: BudgetConfig,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: d_30(),
            budget: BudgetConfig::default(),
        }
    }
}

/// Ceilings that force a session recycle before the engine's own
/// context limit is reached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetConfig {
    /// Estimated-token ceiling per session.
    #[serde(default = "d_1536")]
    pub max_session_tokens: u64,
    /// Request-count ceiling per session.
    #[serde(default = "d_24")]
    pub max_session_requests: u64,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            max_session_tokens: d_1536(),
            max_session_requests: d_24(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Translation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationConfig {
    /// Language every submitted text is translated into.
    #[serde(default = "d_target_language")]
    pub target_language: String,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            target_language: d_target_language(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Serde default helpers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn d_host() -> String {
    "127.0.0.1".into()
}
fn d_port() -> u16 {
    8788
}
fn d_base_url() -> String {
    "http://127.0.0.1:8080".into()
}
fn d_model() -> String {
    "gemma-3-1b-it".into()
}
fn d_512() -> u32 {
    512
}
fn d_top_k() -> Option<u32> {
    Some(40)
}
fn d_top_p() -> Option<f32> {
    Some(0.95)
}
fn d_temperature() -> Option<f32> {
    Some(0.8)
}
fn d_probe_interval() -> u64 {
    1_000
}
fn d_probe_attempts() -> u32 {
    60
}
fn d_30() -> u64 {
    30
}
fn d_1536() -> u64 {
    1_536
}
fn d_24() -> u64 {
    24
}
fn d_target_language() -> String {
    "english".into()
}
