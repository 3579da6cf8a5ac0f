use std::io::Read;

use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::advisor::advisor::{Advisor, ChatAdvisor};
use crate::cli::config::{AdviceInput, AppConfig, check_session_config};
use crate::report::console::{format_console_report, format_plan};
use crate::safety::filter::SafetyFilter;
use crate::session::config::SessionConfig;
use crate::snapshot::snapshot_model::StructuralSnapshot;
use crate::trace::logger::TraceLogger;
use crate::validate::orchestrator::{SnapshotSource, Validator};
use crate::validate::report::ValidationReport;

type CmdResult<T> = Result<T, Box<dyn std::error::Error>>;

// ============================================================================
// Shared helpers
// ============================================================================

/// Read advisory text from `--text`, `--file`, or stdin.
pub fn read_advice(input: &AdviceInput) -> CmdResult<String> {
    if let Some(text) = &input.text {
        return Ok(text.clone());
    }
    if let Some(path) = &input.file {
        return Ok(std::fs::read_to_string(path)?);
    }
    let mut text = String::new();
    std::io::stdin().read_to_string(&mut text)?;
    Ok(text)
}

/// Build a validator from config, with the CLI trace path taking precedence.
pub fn build_validator(config: &AppConfig, trace_override: Option<&str>) -> Validator {
    let validator = Validator::new(SafetyFilter::new(config.safety.clone()));
    match trace_override.or(config.trace_file.as_deref()) {
        Some(path) => validator.with_tracer(TraceLogger::new(path)),
        None => validator,
    }
}

/// Session config with CLI overrides applied, checked before anything is spawned.
pub fn resolve_session_config(config: &AppConfig, port: Option<u16>) -> CmdResult<SessionConfig> {
    let mut session = config.session.clone();
    if let Some(port) = port {
        session.port = port;
    }
    for issue in check_session_config(&session)? {
        warn!(field = issue.field, "{}", issue.message);
    }
    Ok(session)
}

pub fn load_snapshot(path: &str) -> CmdResult<StructuralSnapshot> {
    let content = std::fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&content)?;
    let snapshot = StructuralSnapshot::from_value(&value)
        .ok_or_else(|| format!("{}: no 'elements' array in snapshot", path))?;
    Ok(snapshot)
}

pub fn render_report(report: &ValidationReport, format: &str) -> CmdResult<String> {
    match format {
        "json" => Ok(serde_json::to_string_pretty(report)?),
        "console" => Ok(format!(
            "{}\n{}\n",
            format_console_report(report),
            report.advisory_note()
        )),
        other => Err(format!("Unknown format: '{}'. Use: console, json", other).into()),
    }
}

// ============================================================================
// extract subcommand
// ============================================================================

pub fn cmd_extract(
    input: &AdviceInput,
    format: &str,
    config: &AppConfig,
    trace_file: Option<&str>,
) -> CmdResult<()> {
    let advice = read_advice(input)?;
    let validator = build_validator(config, trace_file);
    let plan = validator.plan(&advice);

    match format {
        "json" => {
            let body = json!({
                "candidatesFound": plan.candidates_found,
                "accepted": plan.filtered.accepted,
                "rejected": plan.filtered.rejected,
                "warnings": plan.filtered.warnings,
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        "console" => print!("{}", format_plan(&plan)),
        other => return Err(format!("Unknown format: '{}'. Use: console, json", other).into()),
    }

    Ok(())
}

// ============================================================================
// validate subcommand
// ============================================================================

/// Returns `true` when the pass reached a session.
#[allow(clippy::too_many_arguments)]
pub async fn cmd_validate(
    input: &AdviceInput,
    url: Option<&str>,
    snapshot_path: Option<&str>,
    format: &str,
    port: Option<u16>,
    config: &AppConfig,
    trace_file: Option<&str>,
    cancel: &CancellationToken,
) -> CmdResult<bool> {
    let advice = read_advice(input)?;
    let session = resolve_session_config(config, port)?;
    let source = match (snapshot_path, url) {
        (Some(path), _) => SnapshotSource::Provided(load_snapshot(path)?),
        (None, Some(url)) => SnapshotSource::Navigate(url.to_string()),
        (None, None) => SnapshotSource::Current,
    };

    let validator = build_validator(config, trace_file).with_cancellation(cancel.clone());
    let report = validator.validate_with_launch(&advice, source, session).await;

    print!("{}", render_report(&report, format)?);
    Ok(report.skipped_reason.is_none())
}

// ============================================================================
// advise subcommand
// ============================================================================

pub async fn cmd_advise(
    error_file: &str,
    url: Option<&str>,
    format: &str,
    config: &AppConfig,
    trace_file: Option<&str>,
    cancel: &CancellationToken,
) -> CmdResult<()> {
    let error_text = std::fs::read_to_string(error_file)?;
    let advisor = ChatAdvisor::new(config.advisor.clone())?;
    run_advise(&advisor, &error_text, url, format, config, trace_file, cancel).await
}

/// Advisor half of `advise`, separated so any [`Advisor`] can drive it.
#[allow(clippy::too_many_arguments)]
pub async fn run_advise(
    advisor: &dyn Advisor,
    error_text: &str,
    url: Option<&str>,
    format: &str,
    config: &AppConfig,
    trace_file: Option<&str>,
    cancel: &CancellationToken,
) -> CmdResult<()> {
    let advice = advisor.advise(error_text).await?;
    info!(length = advice.len(), "received advisory text");
    println!("{}\n", advice);

    let validator = build_validator(config, trace_file).with_cancellation(cancel.clone());
    match url {
        Some(url) => {
            let session = resolve_session_config(config, None)?;
            let report = validator
                .validate_with_launch(&advice, SnapshotSource::Navigate(url.to_string()), session)
                .await;
            print!("{}", render_report(&report, format)?);
        }
        None => print!("{}", format_plan(&validator.plan(&advice))),
    }

    Ok(())
}
