use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How to launch and talk to the automation server (`session:` section of
/// the config file). Durations are milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_command")]
    pub command: String,

    #[serde(default = "default_args")]
    pub args: Vec<String>,

    #[serde(default = "default_host")]
    pub host: String,

    /// `0` picks a free local port at launch.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Environment variable that tells the server which port to listen on.
    #[serde(default = "default_port_env")]
    pub port_env: String,

    /// Stdout substrings that announce the server is listening.
    #[serde(default = "default_ready_markers")]
    pub ready_markers: Vec<String>,

    #[serde(default = "default_ready_timeout")]
    pub ready_timeout_ms: u64,

    #[serde(default = "default_connect_attempts")]
    pub connect_attempts: u32,

    #[serde(default = "default_connect_interval")]
    pub connect_interval_ms: u64,

    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_ms: u64,

    #[serde(default = "default_thirty_seconds")]
    pub connect_timeout_ms: u64,

    #[serde(default = "default_thirty_seconds")]
    pub request_timeout_ms: u64,

    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_ms: u64,
}

fn default_command() -> String { "npx".to_string() }
fn default_args() -> Vec<String> { vec!["@playwright/mcp@latest".to_string()] }
fn default_host() -> String { "localhost".to_string() }
fn default_port() -> u16 { 3001 }
fn default_port_env() -> String { "MCP_WS_PORT".to_string() }
fn default_ready_markers() -> Vec<String> {
    vec!["WebSocket server".to_string(), "listening on".to_string()]
}
fn default_ready_timeout() -> u64 { 5_000 }
fn default_connect_attempts() -> u32 { 10 }
fn default_connect_interval() -> u64 { 1_000 }
fn default_probe_timeout() -> u64 { 2_000 }
fn default_thirty_seconds() -> u64 { 30_000 }
fn default_shutdown_grace() -> u64 { 5_000 }

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            args: default_args(),
            host: default_host(),
            port: default_port(),
            port_env: default_port_env(),
            ready_markers: default_ready_markers(),
            ready_timeout_ms: default_ready_timeout(),
            connect_attempts: default_connect_attempts(),
            connect_interval_ms: default_connect_interval(),
            probe_timeout_ms: default_probe_timeout(),
            connect_timeout_ms: default_thirty_seconds(),
            request_timeout_ms: default_thirty_seconds(),
            shutdown_grace_ms: default_shutdown_grace(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IssueSeverity {
    Error,
    Warning,
}

/// A problem found by `SessionConfig::validate`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigIssue {
    pub field: &'static str,
    pub severity: IssueSeverity,
    pub message: String,
}

impl ConfigIssue {
    fn error(field: &'static str, message: impl Into<String>) -> Self {
        Self { field, severity: IssueSeverity::Error, message: message.into() }
    }

    fn warning(field: &'static str, message: impl Into<String>) -> Self {
        Self { field, severity: IssueSeverity::Warning, message: message.into() }
    }
}

impl SessionConfig {
    pub fn ready_timeout(&self) -> Duration { Duration::from_millis(self.ready_timeout_ms) }
    pub fn connect_interval(&self) -> Duration { Duration::from_millis(self.connect_interval_ms) }
    pub fn probe_timeout(&self) -> Duration { Duration::from_millis(self.probe_timeout_ms) }
    pub fn connect_timeout(&self) -> Duration { Duration::from_millis(self.connect_timeout_ms) }
    pub fn request_timeout(&self) -> Duration { Duration::from_millis(self.request_timeout_ms) }
    pub fn shutdown_grace(&self) -> Duration { Duration::from_millis(self.shutdown_grace_ms) }

    pub fn url_for_port(&self, port: u16) -> String {
        format!("ws://{}:{}", self.host, port)
    }

    /// Check the settings before anything is spawned.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if self.command.trim().is_empty() {
            issues.push(ConfigIssue::error("command", "automation server command not specified"));
        }
        if self.port != 0 && self.port < 1024 {
            issues.push(ConfigIssue::error(
                "port",
                format!("invalid port {} (use 1024-65535, or 0 for any free port)", self.port),
            ));
        }
        if self.host.trim().is_empty() {
            issues.push(ConfigIssue::error("host", "host must not be empty"));
        }
        if self.connect_attempts == 0 {
            issues.push(ConfigIssue::error("connect_attempts", "at least one connection attempt is required"));
        }
        if self.request_timeout_ms < 5_000 {
            issues.push(ConfigIssue::warning(
                "request_timeout_ms",
                format!("{}ms is low; slow pages may time out (recommended: 10000+)", self.request_timeout_ms),
            ));
        }

        issues
    }
}
