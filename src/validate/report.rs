use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::extract::candidate::ActionCandidate;
use crate::safety::filter::Rejection;
use crate::snapshot::matcher::MatchedAction;

pub const HIGH_CONFIDENCE_RATIO: f64 = 0.8;
pub const MEDIUM_CONFIDENCE_RATIO: f64 = 0.5;

/// Result of issuing one matched action through the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub action: MatchedAction,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

impl ValidationOutcome {
    pub fn success(action: MatchedAction, result: Value) -> Self {
        Self {
            action,
            ok: true,
            error: None,
            result: Some(result),
        }
    }

    pub fn failure(action: MatchedAction, error: impl ToString) -> Self {
        Self {
            action,
            ok: false,
            error: Some(error.to_string()),
            result: None,
        }
    }
}

/// Advisory label for the share of actions that validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl ConfidenceTier {
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio >= HIGH_CONFIDENCE_RATIO {
            ConfidenceTier::High
        } else if ratio >= MEDIUM_CONFIDENCE_RATIO {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceTier::High => "high",
            ConfidenceTier::Medium => "medium",
            ConfidenceTier::Low => "low",
        }
    }
}

// ============================================================================
// Validation report
// ============================================================================

/// Aggregated result of one validation pass.
///
/// `total_actions` and `successful_actions` are derived from `outcomes` by
/// [`ValidationReport::from_outcomes`]. The remaining fields are diagnostics:
/// what was extracted, what the safety filter dropped, what found no element,
/// and why the pass was skipped if it never reached a session.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub total_actions: usize,
    pub successful_actions: usize,
    pub outcomes: Vec<ValidationOutcome>,

    #[serde(default)]
    pub candidates_found: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rejections: Vec<Rejection>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unmatched: Vec<ActionCandidate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skipped_reason: Option<String>,
}

impl ValidationReport {
    pub fn from_outcomes(outcomes: Vec<ValidationOutcome>) -> Self {
        Self {
            total_actions: outcomes.len(),
            successful_actions: outcomes.iter().filter(|o| o.ok).count(),
            outcomes,
            ..Default::default()
        }
    }

    pub fn with_candidates_found(mut self, count: usize) -> Self {
        self.candidates_found = count;
        self
    }

    pub fn with_rejections(mut self, rejections: Vec<Rejection>) -> Self {
        self.rejections = rejections;
        self
    }

    pub fn with_unmatched(mut self, unmatched: Vec<ActionCandidate>) -> Self {
        self.unmatched = unmatched;
        self
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }

    pub fn with_skipped(mut self, reason: impl ToString) -> Self {
        self.skipped_reason = Some(reason.to_string());
        self
    }

    pub fn failed_actions(&self) -> usize {
        self.total_actions.saturating_sub(self.successful_actions)
    }

    /// Share of attempted actions that succeeded; 0 when nothing was attempted.
    pub fn success_ratio(&self) -> f64 {
        if self.total_actions == 0 {
            return 0.0;
        }
        (self.successful_actions as f64 / self.total_actions as f64).min(1.0)
    }

    pub fn confidence_tier(&self) -> ConfidenceTier {
        ConfidenceTier::from_ratio(self.success_ratio())
    }

    /// One-paragraph summary for the caller's report.
    pub fn advisory_note(&self) -> String {
        if let Some(reason) = &self.skipped_reason {
            return format!("Action validation skipped: {}", reason);
        }
        if self.total_actions == 0 {
            return format!(
                "No suggested actions could be validated ({} found, {} rejected, {} without a matching element).",
                self.candidates_found,
                self.rejections.len(),
                self.unmatched.len()
            );
        }
        format!(
            "Validated {}/{} suggested actions ({:.0}%): {} confidence.",
            self.successful_actions,
            self.total_actions,
            self.success_ratio() * 100.0,
            self.confidence_tier().as_str()
        )
    }
}
