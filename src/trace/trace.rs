use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::{
    extract::candidate::ActionCandidate, safety::filter::Rejection,
    validate::report::{ValidationOutcome, ValidationReport},
};

/// Pipeline stage a trace line was written from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceStage {
    Extracted,
    Rejected,
    Unmatched,
    Outcome,
    Skipped,
    Summary,
}

/// One JSONL record describing a validation decision.
#[derive(Debug, Serialize)]
pub struct TraceEvent {
    pub timestamp_ms: u128,
    pub stage: TraceStage,

    pub action: Option<String>,
    pub element_ref: Option<String>,
    pub strategy: Option<String>,

    pub confidence: Option<f32>,
    pub ok: Option<bool>,
    pub detail: Option<String>,
}

impl TraceEvent {
    pub fn now(stage: TraceStage) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis(),
            stage,
            action: None,
            element_ref: None,
            strategy: None,
            confidence: None,
            ok: None,
            detail: None,
        }
    }

    pub fn extracted(candidate: &ActionCandidate) -> Self {
        Self::now(TraceStage::Extracted).with_candidate(candidate)
    }

    pub fn rejected(rejection: &Rejection) -> Self {
        Self::now(TraceStage::Rejected)
            .with_candidate(&rejection.candidate)
            .with_detail(&rejection.reason)
    }

    pub fn unmatched(candidate: &ActionCandidate) -> Self {
        Self::now(TraceStage::Unmatched)
            .with_candidate(candidate)
            .with_detail("no element in snapshot")
    }

    pub fn outcome(outcome: &ValidationOutcome) -> Self {
        let mut event = Self::now(TraceStage::Outcome).with_candidate(&outcome.action.candidate);
        event.element_ref = Some(outcome.action.element_ref.clone());
        event.strategy = Some(format!("{:?}", outcome.action.strategy));
        event.ok = Some(outcome.ok);
        event.detail = outcome.error.clone();
        event
    }

    pub fn skipped(reason: impl ToString) -> Self {
        Self::now(TraceStage::Skipped).with_detail(reason)
    }

    /// Closing line of a pass: the success ratio and the advisory note.
    pub fn summary(report: &ValidationReport) -> Self {
        let mut event = Self::now(TraceStage::Summary).with_detail(report.advisory_note());
        event.confidence = Some(report.success_ratio() as f32);
        event.ok = Some(report.skipped_reason.is_none());
        event
    }

    pub fn with_candidate(mut self, candidate: &ActionCandidate) -> Self {
        self.action = Some(candidate.describe());
        self.confidence = Some(candidate.confidence);
        self
    }

    pub fn with_detail(mut self, detail: impl ToString) -> Self {
        self.detail = Some(detail.to_string());
        self
    }
}
