use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::extract::candidate::{ActionCandidate, ActionKind};

pub const DEFAULT_CONFIDENCE_FLOOR: f32 = 0.3;
pub const DEFAULT_MAX_FILL_LENGTH: usize = 1000;

/// Substrings that mark a fill value as a script-injection attempt.
pub const INJECTION_MARKERS: &[&str] = &["<script", "javascript:", "data:"];

fn default_denied_verbs() -> Vec<String> {
    ["delete", "remove", "destroy", "drop", "truncate"]
        .iter()
        .map(|v| v.to_string())
        .collect()
}

fn default_floor() -> f32 { DEFAULT_CONFIDENCE_FLOOR }
fn default_max_fill() -> usize { DEFAULT_MAX_FILL_LENGTH }
fn default_true() -> bool { true }

/// Tunables for the safety filter (`safety:` section of the config file).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyConfig {
    #[serde(default = "default_floor")]
    pub confidence_floor: f32,

    #[serde(default = "default_max_fill")]
    pub max_fill_length: usize,

    /// When false, overlong fill values are only warned about.
    #[serde(default = "default_true")]
    pub enforce_fill_length: bool,

    #[serde(default = "default_denied_verbs")]
    pub denied_verbs: Vec<String>,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            confidence_floor: DEFAULT_CONFIDENCE_FLOOR,
            max_fill_length: DEFAULT_MAX_FILL_LENGTH,
            enforce_fill_length: true,
            denied_verbs: default_denied_verbs(),
        }
    }
}

/// Why a candidate was kept out of execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RejectionReason {
    DestructiveVerb { verb: String },
    InjectionMarker { marker: String },
    OverlongValue { length: usize, limit: usize },
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectionReason::DestructiveVerb { verb } => {
                write!(f, "destructive action ('{}')", verb)
            }
            RejectionReason::InjectionMarker { marker } => {
                write!(f, "fill value contains '{}'", marker)
            }
            RejectionReason::OverlongValue { length, limit } => {
                write!(f, "fill value is {} chars (limit {})", length, limit)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rejection {
    pub candidate: ActionCandidate,
    pub reason: RejectionReason,
}

/// Partition of the filter input. Every input candidate lands in exactly one
/// of `accepted` or `rejected`, unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterOutcome {
    pub accepted: Vec<ActionCandidate>,
    pub rejected: Vec<Rejection>,
    pub warnings: Vec<String>,
}

// ============================================================================
// Filter
// ============================================================================

pub struct SafetyFilter {
    config: SafetyConfig,
    denied: Vec<String>,
}

impl Default for SafetyFilter {
    fn default() -> Self {
        Self::new(SafetyConfig::default())
    }
}

impl SafetyFilter {
    pub fn new(config: SafetyConfig) -> Self {
        let denied = config.denied_verbs.iter().map(|v| v.to_lowercase()).collect();
        Self { config, denied }
    }

    pub fn config(&self) -> &SafetyConfig {
        &self.config
    }

    /// Partition candidates into accepted and rejected. Never fails.
    pub fn filter(&self, candidates: &[ActionCandidate]) -> FilterOutcome {
        let mut outcome = FilterOutcome::default();

        for candidate in candidates {
            match self.check(candidate, &mut outcome.warnings) {
                Some(reason) => {
                    warn!(action = %candidate.describe(), %reason, "rejected action candidate");
                    outcome.rejected.push(Rejection {
                        candidate: candidate.clone(),
                        reason,
                    });
                }
                None => {
                    debug!(action = %candidate.describe(), "accepted action candidate");
                    outcome.accepted.push(candidate.clone());
                }
            }
        }

        outcome
    }

    /// First rejection reason for a candidate, pushing any warnings on the way.
    fn check(&self, candidate: &ActionCandidate, warnings: &mut Vec<String>) -> Option<RejectionReason> {
        if candidate.confidence < self.config.confidence_floor {
            warnings.push(format!(
                "Low confidence action: {} ({:.2})",
                candidate.source_span, candidate.confidence
            ));
        }

        let serialized = serde_json::to_string(candidate)
            .unwrap_or_else(|_| candidate.source_span.clone())
            .to_lowercase();
        if let Some(verb) = self.denied.iter().find(|v| serialized.contains(v.as_str())) {
            return Some(RejectionReason::DestructiveVerb { verb: verb.clone() });
        }

        if candidate.kind != ActionKind::Fill {
            return None;
        }
        let value = candidate.value_hint.as_deref()?;

        let length = value.chars().count();
        if length > self.config.max_fill_length {
            let preview: String = value.chars().take(50).collect();
            warnings.push(format!("Very long fill value: {}...", preview));
            if self.config.enforce_fill_length {
                return Some(RejectionReason::OverlongValue {
                    length,
                    limit: self.config.max_fill_length,
                });
            }
        }

        let lowered = value.to_lowercase();
        INJECTION_MARKERS
            .iter()
            .find(|m| lowered.contains(*m))
            .map(|m| RejectionReason::InjectionMarker {
                marker: m.to_string(),
            })
    }
}
