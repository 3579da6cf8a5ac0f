use std::io::Write;

use action_bridge::cli::config::{
    AppConfig, ConfigError, check_session_config, load_config, try_load_config,
};
use action_bridge::session::config::{IssueSeverity, SessionConfig};

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

// ============================================================================
// Defaults
// ============================================================================

#[test]
fn test_session_defaults() {
    let config = SessionConfig::default();
    assert_eq!(config.command, "npx");
    assert_eq!(config.args, vec!["@playwright/mcp@latest"]);
    assert_eq!(config.port, 3001);
    assert_eq!(config.port_env, "MCP_WS_PORT");
    assert_eq!(config.connect_attempts, 10);
    assert_eq!(config.request_timeout_ms, 30_000);
    assert_eq!(config.url_for_port(3001), "ws://localhost:3001");
    assert!(config.validate().is_empty());
}

#[test]
fn test_app_defaults() {
    let config = AppConfig::default();
    assert_eq!(config.safety.confidence_floor, 0.3);
    assert_eq!(config.safety.max_fill_length, 1000);
    assert_eq!(config.advisor.max_prompt_length, 2000);
    assert!(config.trace_file.is_none());
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_load_partial_yaml() {
    let file = write_config(
        "session:\n  port: 4500\n  command: node\n  args: [server.js]\nsafety:\n  denied_verbs: [logout]\ntrace_file: trace.jsonl\n",
    );
    let config = load_config(file.path().to_str());

    assert_eq!(config.session.port, 4500);
    assert_eq!(config.session.command, "node");
    assert_eq!(config.session.args, vec!["server.js"]);
    assert_eq!(config.session.host, "localhost");
    assert_eq!(config.safety.denied_verbs, vec!["logout"]);
    assert_eq!(config.safety.max_fill_length, 1000);
    assert_eq!(config.trace_file.as_deref(), Some("trace.jsonl"));
}

#[test]
fn test_malformed_yaml_falls_back_to_defaults() {
    let file = write_config("session: [not, a, map\n");
    assert!(matches!(
        try_load_config(file.path().to_str()),
        Err(ConfigError::Parse { .. })
    ));
    assert_eq!(load_config(file.path().to_str()).session.port, 3001);
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let err = try_load_config(Some("/nonexistent/action-bridge.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
    assert_eq!(load_config(Some("/nonexistent/action-bridge.yaml")).session.command, "npx");
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn test_privileged_port_is_an_error() {
    let config = SessionConfig {
        port: 80,
        ..SessionConfig::default()
    };
    let issues = config.validate();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].field, "port");
    assert_eq!(issues[0].severity, IssueSeverity::Error);
    assert!(check_session_config(&config).is_err());
}

#[test]
fn test_port_zero_is_allowed() {
    let config = SessionConfig {
        port: 0,
        ..SessionConfig::default()
    };
    assert!(config.validate().is_empty());
}

#[test]
fn test_empty_command_and_zero_attempts() {
    let config = SessionConfig {
        command: "  ".into(),
        connect_attempts: 0,
        ..SessionConfig::default()
    };
    match check_session_config(&config) {
        Err(ConfigError::Invalid(message)) => {
            assert!(message.contains("command"));
            assert!(message.contains("connect_attempts"));
        }
        other => panic!("expected invalid config, got {:?}", other),
    }
}

#[test]
fn test_low_request_timeout_is_a_warning() {
    let config = SessionConfig {
        request_timeout_ms: 1_000,
        ..SessionConfig::default()
    };
    let warnings = check_session_config(&config).unwrap();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].field, "request_timeout_ms");
    assert_eq!(warnings[0].severity, IssueSeverity::Warning);
}
