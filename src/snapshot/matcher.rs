use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::extract::candidate::{ActionCandidate, ActionKind, SyntaxVariant};
use crate::snapshot::snapshot_model::{StructuralElement, StructuralSnapshot};

static CLASS_TOKEN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\.([A-Za-z0-9_-]+)").ok());

/// How a candidate was resolved, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    ExactSelector,
    Role,
    Text,
    Attribute,
    Placeholder,
    Label,
}

impl MatchStrategy {
    pub const PRIORITY: [MatchStrategy; 6] = [
        MatchStrategy::ExactSelector,
        MatchStrategy::Role,
        MatchStrategy::Text,
        MatchStrategy::Attribute,
        MatchStrategy::Placeholder,
        MatchStrategy::Label,
    ];
}

/// A candidate resolved to a concrete element of one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedAction {
    pub candidate: ActionCandidate,
    #[serde(rename = "ref")]
    pub element_ref: String,
    pub strategy: MatchStrategy,
}

// ============================================================================
// Matching
// ============================================================================

/// Resolve a candidate against a snapshot.
///
/// Strategies are tried in `MatchStrategy::PRIORITY` order; within a strategy,
/// elements are tried in snapshot order. Elements without a ref are skipped.
pub fn match_candidate<'s>(
    candidate: &ActionCandidate,
    snapshot: &'s StructuralSnapshot,
) -> Option<(&'s StructuralElement, MatchStrategy)> {
    MatchStrategy::PRIORITY.iter().find_map(|&strategy| {
        snapshot
            .elements
            .iter()
            .filter(|e| !e.element_ref.is_empty())
            .find(|e| qualifies(strategy, candidate, e))
            .map(|e| (e, strategy))
    })
}

/// Resolve every candidate, preserving input order. Unmatched candidates are
/// returned separately.
pub fn match_all(
    candidates: &[ActionCandidate],
    snapshot: &StructuralSnapshot,
) -> (Vec<MatchedAction>, Vec<ActionCandidate>) {
    let mut matched = Vec::new();
    let mut unmatched = Vec::new();

    for candidate in candidates {
        match match_candidate(candidate, snapshot) {
            Some((element, strategy)) => {
                debug!(
                    action = %candidate.describe(),
                    element_ref = %element.element_ref,
                    ?strategy,
                    "mapped action to snapshot element"
                );
                matched.push(MatchedAction {
                    candidate: candidate.clone(),
                    element_ref: element.element_ref.clone(),
                    strategy,
                });
            }
            None => {
                warn!(selector = %candidate.selector_hint, "could not find element for action");
                unmatched.push(candidate.clone());
            }
        }
    }

    (matched, unmatched)
}

/// Whether `element` satisfies `strategy` for `candidate`.
pub fn qualifies(
    strategy: MatchStrategy,
    candidate: &ActionCandidate,
    element: &StructuralElement,
) -> bool {
    let hint = candidate.selector_hint.as_str();
    match strategy {
        MatchStrategy::ExactSelector => element.selector.as_deref() == Some(hint),
        MatchStrategy::Role => matches_role(candidate, element),
        MatchStrategy::Text => contains_non_empty(hint, element.text.as_deref()),
        MatchStrategy::Attribute => matches_attributes(hint, element),
        MatchStrategy::Placeholder => {
            candidate.kind == ActionKind::Fill
                && contains_non_empty(hint, element.attribute("placeholder"))
        }
        MatchStrategy::Label => contains_non_empty(hint, element.label.as_deref()),
    }
}

/// Role implied by the candidate: the role argument of getByRole, or
/// "button" when the hint mentions one.
fn implied_role(candidate: &ActionCandidate) -> Option<String> {
    if candidate.variant == SyntaxVariant::Role {
        return Some(candidate.selector_hint.to_lowercase());
    }
    if candidate.selector_hint.to_lowercase().contains("button") {
        return Some("button".to_string());
    }
    None
}

fn matches_role(candidate: &ActionCandidate, element: &StructuralElement) -> bool {
    let Some(role) = implied_role(candidate) else {
        return false;
    };
    let role_ok = element
        .role
        .as_deref()
        .is_some_and(|r| r.eq_ignore_ascii_case(&role));
    if !role_ok {
        return false;
    }
    match candidate.name_hint.as_deref() {
        None => true,
        Some(name) => element.name.as_deref().is_some_and(|n| n.contains(name)),
    }
}

fn matches_attributes(hint: &str, element: &StructuralElement) -> bool {
    if contains_non_empty(hint, element.attribute("data-testid")) {
        return true;
    }

    if hint.contains('#') && contains_non_empty(hint, element.attribute("id")) {
        return true;
    }

    if hint.contains('.') {
        if let (Some(classes), Some(re)) = (element.attribute("class"), CLASS_TOKEN.as_ref()) {
            let element_classes: Vec<&str> = classes.split_whitespace().collect();
            return re
                .captures_iter(hint)
                .filter_map(|c| c.get(1))
                .any(|token| element_classes.contains(&token.as_str()));
        }
    }

    false
}

fn contains_non_empty(haystack: &str, needle: Option<&str>) -> bool {
    needle.is_some_and(|n| !n.is_empty() && haystack.contains(n))
}
