//! OpenAI-compatible adapter.
//!
//! Works with llama.cpp server, Ollama, vLLM, LM Studio, and any other
//! local endpoint that follows the chat-completions contract. The
//! "native session" here is the message history the adapter carries:
//! every turn re-sends the accumulated conversation, which is exactly
//! the context growth the scheduler's budget tracker bounds.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use pl_domain::config::EngineConfig;
use pl_domain::error::{Error, Result};

use crate::traits::{EngineSession, EngineStatus, InferenceEngine, SessionConfig};

const STATUS_INITIALIZING: u8 = 0;
const STATUS_READY: u8 = 1;
const STATUS_UNAVAILABLE: u8 = 2;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Engine
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Adapter for an OpenAI-compatible inference server.
///
/// Availability is driven by a background readiness probe started in
/// [`OpenAiCompatEngine::connect`]: the engine reports `Initializing`
/// until the models endpoint answers, and `Unavailable` once the probe
/// budget is exhausted (e.g. the server never came up).
pub struct OpenAiCompatEngine {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
    status: Arc<AtomicU8>,
}

impl OpenAiCompatEngine {
    /// Build the adapter and start the readiness probe.
    ///
    /// Must be called from within a tokio runtime.
    pub fn connect(cfg: &EngineConfig) -> Result<Arc<Self>> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        let engine = Arc::new(Self {
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone(),
            client,
            status: Arc::new(AtomicU8::new(STATUS_INITIALIZING)),
        });

        tokio::spawn(probe_until_ready(
            engine.clone(),
            Duration::from_millis(cfg.probe_interval_ms),
            cfg.probe_attempts,
        ));

        Ok(engine)
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => req.header("Authorization", format!("Bearer {key}")),
            None => req,
        }
    }

    async fn probe_once(&self) -> bool {
        let url = format!("{}/v1/models", self.base_url);
        match self.authorize(self.client.get(&url)).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }
}

/// Poll the models endpoint until the engine answers or the attempt
/// budget runs out.
async fn probe_until_ready(engine: Arc<OpenAiCompatEngine>, interval: Duration, attempts: u32) {
    for attempt in 0..attempts {
        if engine.probe_once().await {
            engine.status.store(STATUS_READY, Ordering::Release);
            tracing::info!(base_url = %engine.base_url, "inference engine ready");
            return;
        }
        tracing::debug!(attempt, "engine not ready yet");
        tokio::time::sleep(interval).await;
    }
    engine.status.store(STATUS_UNAVAILABLE, Ordering::Release);
    tracing::error!(
        base_url = %engine.base_url,
        "inference engine did not become ready, giving up"
    );
}

#[async_trait::async_trait]
impl InferenceEngine for OpenAiCompatEngine {
    fn status(&self) -> EngineStatus {
        match self.status.load(Ordering::Acquire) {
            STATUS_READY => EngineStatus::Ready,
            STATUS_UNAVAILABLE => EngineStatus::Unavailable,
            _ => EngineStatus::Initializing,
        }
    }

    async fn create_session(&self, config: &SessionConfig) -> Result<Box<dyn EngineSession>> {
        match self.status() {
            EngineStatus::Ready => {}
            EngineStatus::Initializing => return Err(Error::NotReady),
            EngineStatus::Unavailable => return Err(Error::Unavailable),
        }
        Ok(Box::new(ChatSession {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            config: config.clone(),
            messages: Vec::new(),
            closed: false,
        }))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

/// One conversation against the chat-completions endpoint.
struct ChatSession {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    config: SessionConfig,
    messages: Vec<WireMessage>,
    closed: bool,
}

#[async_trait::async_trait]
impl EngineSession for ChatSession {
    async fn generate(&mut self, prompt: &str) -> Result<String> {
        if self.closed {
            return Err(Error::Engine("session is closed".into()));
        }

        // Build the turn on a scratch copy and commit only once the
        // call has fully succeeded. The worker may drop this future at
        // its timeout, and a half-recorded turn must not leak into the
        // next call's context.
        let mut messages = self.messages.clone();
        messages.push(WireMessage {
            role: "user",
            content: prompt.to_string(),
        });
        let body = build_body(&self.config, &messages);

        let url = format!("{}/v1/chat/completions", self.base_url);
        let mut req = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            req = req.header("Authorization", format!("Bearer {key}"));
        }

        let resp = req.send().await.map_err(|e| Error::Http(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(Error::Http(format!("{status}: {detail}")));
        }

        let value: Value = resp.json().await.map_err(|e| Error::Http(e.to_string()))?;
        let content = extract_content(&value)?;

        messages.push(WireMessage {
            role: "assistant",
            content: content.clone(),
        });
        self.messages = messages;
        Ok(content)
    }

    async fn close(&mut self) {
        // Stateless transport; dropping the history is the release.
        self.messages.clear();
        self.closed = true;
    }
}

/// Build the chat-completions request body.
///
/// `top_k` is outside the strict OpenAI schema but accepted by the
/// local backends this adapter targets; it is serialized only when
/// configured.
fn build_body(config: &SessionConfig, messages: &[WireMessage]) -> Value {
    let mut body = serde_json::json!({
        "model": config.model,
        "messages": messages,
        "max_tokens": config.max_tokens,
    });
    if let Some(t) = config.temperature {
        body["temperature"] = t.into();
    }
    if let Some(p) = config.top_p {
        body["top_p"] = p.into();
    }
    if let Some(k) = config.top_k {
        body["top_k"] = k.into();
    }
    body
}

/// Pull the completion text out of a chat-completions response.
fn extract_content(value: &Value) -> Result<String> {
    value["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| Error::Engine("response has no message content".into()))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> SessionConfig {
        SessionConfig {
            model: "gemma-3-1b-it".into(),
            max_tokens: 512,
            top_k: Some(40),
            top_p: Some(0.95),
            temperature: Some(0.8),
        }
    }

    #[test]
    fn body_carries_sampling_params() {
        let messages = vec![WireMessage {
            role: "user",
            content: "hola".into(),
        }];
        let body = build_body(&test_config(), &messages);
        assert_eq!(body["model"], "gemma-3-1b-it");
        assert_eq!(body["max_tokens"], 512);
        assert_eq!(body["top_k"], 40);
        assert_eq!(body["messages"][0]["role"], "user");
    }

    #[test]
    fn unset_sampling_params_are_omitted() {
        let config = SessionConfig {
            top_k: None,
            top_p: None,
            temperature: None,
            ..test_config()
        };
        let body = build_body(&config, &[]);
        assert!(body.get("top_k").is_none());
        assert!(body.get("top_p").is_none());
        assert!(body.get("temperature").is_none());
    }

    #[test]
    fn extract_content_reads_first_choice() {
        let value = serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": "bonjour" } }]
        });
        assert_eq!(extract_content(&value).unwrap(), "bonjour");
    }

    #[test]
    fn extract_content_rejects_malformed_response() {
        let value = serde_json::json!({ "choices": [] });
        assert!(extract_content(&value).is_err());
    }

    /// Session pointed at a port nothing listens on; every call fails
    /// at the transport.
    fn unreachable_session() -> ChatSession {
        ChatSession {
            client: reqwest::Client::new(),
            base_url: "http://127.0.0.1:9".into(),
            api_key: None,
            config: test_config(),
            messages: Vec::new(),
            closed: false,
        }
    }

    #[tokio::test]
    async fn failed_generate_leaves_history_untouched() {
        let mut session = unreachable_session();
        assert!(session.generate("hola").await.is_err());
        assert!(session.messages.is_empty());

        // A later call still sees a clean history.
        assert!(session.generate("mundo").await.is_err());
        assert!(session.messages.is_empty());
    }

    #[tokio::test]
    async fn dropped_generate_leaves_history_untouched() {
        let mut session = unreachable_session();
        {
            // Poll the call once so the request is in flight, then
            // drop it — the shape of a worker-side timeout.
            let call = session.generate("hola");
            tokio::pin!(call);
            tokio::select! {
                biased;
                _ = &mut call => {}
                _ = std::future::ready(()) => {}
            }
        }
        assert!(session.messages.is_empty());
    }
}
