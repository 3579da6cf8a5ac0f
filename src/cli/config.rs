use std::path::Path;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::advisor::advisor::AdvisorConfig;
use crate::safety::filter::SafetyConfig;
use crate::session::config::{ConfigIssue, IssueSeverity, SessionConfig};

pub const DEFAULT_CONFIG_PATH: &str = "action-bridge.yaml";

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "action-bridge",
    version,
    about = "Validate AI-suggested browser actions against a live page"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: action-bridge.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Write a JSONL trace of validation decisions to this file
    #[arg(long, global = true)]
    pub trace_file: Option<String>,
}

/// Where advisory text is read from: `--text`, `--file`, or stdin.
#[derive(clap::Args, Debug, Clone)]
pub struct AdviceInput {
    /// Advisory text given inline
    #[arg(long, conflicts_with = "file")]
    pub text: Option<String>,

    /// File containing advisory text
    #[arg(long)]
    pub file: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract candidate actions from advisory text and show filter verdicts
    Extract {
        #[command(flatten)]
        input: AdviceInput,

        /// Output format: console or json
        #[arg(long, default_value = "console")]
        format: String,
    },

    /// Launch the automation server and validate advisory text against a page
    Validate {
        #[command(flatten)]
        input: AdviceInput,

        /// Page to navigate to before taking the snapshot
        #[arg(long, conflicts_with = "snapshot")]
        url: Option<String>,

        /// JSON file holding a previously captured structural snapshot
        #[arg(long)]
        snapshot: Option<String>,

        /// Output format: console or json
        #[arg(long, default_value = "console")]
        format: String,

        /// Automation server WebSocket port (0 picks a free port)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Ask the advisor about a test error and optionally validate its answer
    Advise {
        /// File containing the test error output
        #[arg(long)]
        error_file: String,

        /// Validate the suggested actions against this page
        #[arg(long)]
        url: Option<String>,

        /// Output format: console or json
        #[arg(long, default_value = "console")]
        format: String,
    },
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `action-bridge.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub safety: SafetyConfig,
    #[serde(default)]
    pub advisor: AdvisorConfig,
    #[serde(default)]
    pub trace_file: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid session configuration: {0}")]
    Invalid(String),
}

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. A missing default file yields defaults;
/// an explicitly named file must exist.
pub fn try_load_config(path: Option<&str>) -> Result<AppConfig, ConfigError> {
    let config_path = path.unwrap_or(DEFAULT_CONFIG_PATH);
    if path.is_none() && !Path::new(config_path).exists() {
        return Ok(AppConfig::default());
    }
    let content = std::fs::read_to_string(config_path).map_err(|source| ConfigError::Read {
        path: config_path.to_string(),
        source,
    })?;
    serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: config_path.to_string(),
        source,
    })
}

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    match try_load_config(path) {
        Ok(config) => config,
        Err(e) => {
            warn!("{}; using defaults", e);
            AppConfig::default()
        }
    }
}

/// Fail on error-level session issues, returning the warnings.
pub fn check_session_config(config: &SessionConfig) -> Result<Vec<ConfigIssue>, ConfigError> {
    let (errors, warnings): (Vec<_>, Vec<_>) = config
        .validate()
        .into_iter()
        .partition(|issue| issue.severity == IssueSeverity::Error);

    if !errors.is_empty() {
        let joined = errors
            .iter()
            .map(|issue| format!("{}: {}", issue.field, issue.message))
            .collect::<Vec<_>>()
            .join("; ");
        return Err(ConfigError::Invalid(joined));
    }
    Ok(warnings)
}
