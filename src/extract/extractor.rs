use std::collections::HashMap;

use tracing::{debug, info};

use crate::extract::candidate::{ActionCandidate, ActionKind, CandidateKey};
use crate::extract::patterns::{ACTION_PATTERNS, ActionPattern};

pub const BASE_CONFIDENCE: f32 = 0.5;
pub const CSS_SHORTHAND_PENALTY: f32 = 0.10;
pub const ATTRIBUTE_SELECTOR_PENALTY: f32 = 0.05;
pub const INTENT_BONUS: f32 = 0.10;

// ============================================================================
// Extraction
// ============================================================================

/// Scan advisory text for action-shaped substrings.
///
/// Never fails: text without recognizable actions yields an empty list.
/// The result is deduplicated by `(kind, selector, value)` keeping the
/// highest-confidence instance, and sorted by descending confidence. Ties keep
/// table order, then position in the text.
pub fn extract(text: &str) -> Vec<ActionCandidate> {
    extract_with(text, &ACTION_PATTERNS)
}

/// Same as [`extract`] with an explicit pattern table.
pub fn extract_with(text: &str, patterns: &[ActionPattern]) -> Vec<ActionCandidate> {
    let mut found = Vec::new();

    for pattern in patterns {
        for caps in pattern.regex.captures_iter(text) {
            let Some(selector) = caps
                .name("sel")
                .map(|m| m.as_str().trim())
                .filter(|s| !s.is_empty())
            else {
                continue;
            };

            let value = caps
                .name("value")
                .map(|m| m.as_str().to_string())
                .filter(|v| !v.is_empty());

            // A fill without a value in the same match is not actionable.
            if pattern.kind == ActionKind::Fill && value.is_none() {
                debug!(selector, "discarding fill match without a value");
                continue;
            }

            let name = caps
                .name("name")
                .map(|m| m.as_str().trim().to_string())
                .filter(|n| !n.is_empty());

            let span = caps.get(0).map(|m| m.as_str()).unwrap_or(selector);

            found.push(ActionCandidate {
                kind: pattern.kind,
                selector_hint: selector.to_string(),
                value_hint: value,
                name_hint: name,
                variant: pattern.variant,
                source_span: span.to_string(),
                confidence: score(pattern.kind, pattern.confidence_delta, selector),
            });
        }
    }

    let mut candidates = dedup_keep_highest(found);
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    info!(count = candidates.len(), "parsed action candidates from advice");
    candidates
}

// ============================================================================
// Scoring
// ============================================================================

/// Heuristic confidence for a match, clamped to [0, 1].
pub fn score(kind: ActionKind, syntax_delta: f32, selector_hint: &str) -> f32 {
    let mut confidence = BASE_CONFIDENCE + syntax_delta;

    if selector_hint.contains('#') || selector_hint.contains('.') {
        confidence -= CSS_SHORTHAND_PENALTY;
    }
    if selector_hint.contains('[') {
        confidence -= ATTRIBUTE_SELECTOR_PENALTY;
    }

    let hint = selector_hint.to_lowercase();
    match kind {
        ActionKind::Click if hint.contains("button") => confidence += INTENT_BONUS,
        ActionKind::Fill if hint.contains("input") => confidence += INTENT_BONUS,
        _ => {}
    }

    confidence.clamp(0.0, 1.0)
}

/// Collapse candidates sharing a key, keeping the highest confidence.
/// The survivor takes the slot of the first occurrence.
fn dedup_keep_highest(candidates: Vec<ActionCandidate>) -> Vec<ActionCandidate> {
    let mut slots: HashMap<CandidateKey, usize> = HashMap::new();
    let mut unique: Vec<ActionCandidate> = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        match slots.get(&candidate.key()) {
            Some(&idx) => {
                if candidate.confidence > unique[idx].confidence {
                    unique[idx] = candidate;
                }
            }
            None => {
                slots.insert(candidate.key(), unique.len());
                unique.push(candidate);
            }
        }
    }

    unique
}
