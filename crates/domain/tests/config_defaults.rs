use pl_domain::config::Config;

#[test]
fn default_host_is_localhost() {
    let config = Config::default();
    assert_eq!(config.server.host, "127.0.0.1");
}

#[test]
fn explicit_host_and_port_parse() {
    let toml_str = r#"
[server]
host = "0.0.0.0"
port = 9090
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 9090);
}

#[test]
fn default_budget_ceilings() {
    let config = Config::default();
    assert_eq!(config.scheduler.budget.max_session_tokens, 1536);
    assert_eq!(config.scheduler.budget.max_session_requests, 24);
}

#[test]
fn default_timeout_is_thirty_seconds() {
    let config = Config::default();
    assert_eq!(config.scheduler.request_timeout_secs, 30);
}

#[test]
fn budget_overrides_parse() {
    let toml_str = r#"
[scheduler.budget]
max_session_tokens = 999
max_session_requests = 2
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.scheduler.budget.max_session_tokens, 999);
    assert_eq!(config.scheduler.budget.max_session_requests, 2);
}

#[test]
fn engine_sampling_defaults() {
    let config = Config::default();
    assert_eq!(config.engine.max_tokens, 512);
    assert_eq!(config.engine.top_k, Some(40));
    assert_eq!(config.engine.top_p, Some(0.95));
    assert_eq!(config.engine.temperature, Some(0.8));
}

#[test]
fn partial_engine_section_keeps_other_defaults() {
    let toml_str = r#"
[engine]
base_url = "http://127.0.0.1:11434"
model = "qwen2.5:3b"
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.engine.base_url, "http://127.0.0.1:11434");
    assert_eq!(config.engine.model, "qwen2.5:3b");
    assert_eq!(config.engine.max_tokens, 512);
}

#[test]
fn default_target_language() {
    let config = Config::default();
    assert_eq!(config.translation.target_language, "english");
}
