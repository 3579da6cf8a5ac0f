use action_bridge::extract::candidate::{ActionCandidate, ActionKind, SyntaxVariant};
use action_bridge::report::console::{format_console_report, format_plan};
use action_bridge::safety::filter::{Rejection, RejectionReason, SafetyFilter};
use action_bridge::snapshot::matcher::{MatchStrategy, MatchedAction};
use action_bridge::validate::orchestrator::ValidationPlan;
use action_bridge::validate::report::{ConfidenceTier, ValidationOutcome, ValidationReport};
use serde_json::json;

// ============================================================================
// Helper builders
// ============================================================================

fn candidate(selector: &str) -> ActionCandidate {
    ActionCandidate {
        kind: ActionKind::Click,
        selector_hint: selector.to_string(),
        value_hint: None,
        name_hint: None,
        variant: SyntaxVariant::PlainCall,
        source_span: format!("page.click('{}')", selector),
        confidence: 0.4,
    }
}

fn action(selector: &str, element_ref: &str) -> MatchedAction {
    MatchedAction {
        candidate: candidate(selector),
        element_ref: element_ref.to_string(),
        strategy: MatchStrategy::ExactSelector,
    }
}

fn outcomes(ok: usize, failed: usize) -> Vec<ValidationOutcome> {
    let mut out = Vec::new();
    for i in 0..ok {
        out.push(ValidationOutcome::success(
            action(&format!("#ok{}", i), &format!("e{}", i)),
            json!({}),
        ));
    }
    for i in 0..failed {
        out.push(ValidationOutcome::failure(
            action(&format!("#bad{}", i), &format!("f{}", i)),
            "Element is not visible",
        ));
    }
    out
}

// ============================================================================
// Aggregation
// ============================================================================

#[test]
fn test_successful_count_matches_ok_outcomes() {
    for (ok, failed) in [(0, 0), (1, 0), (0, 3), (2, 2), (5, 1)] {
        let report = ValidationReport::from_outcomes(outcomes(ok, failed));
        assert_eq!(report.total_actions, ok + failed);
        assert_eq!(
            report.successful_actions,
            report.outcomes.iter().filter(|o| o.ok).count()
        );
        assert_eq!(report.failed_actions(), failed);
    }
}

#[test]
fn test_empty_report() {
    let report = ValidationReport::from_outcomes(vec![]);
    assert_eq!(report.total_actions, 0);
    assert_eq!(report.success_ratio(), 0.0);
    assert_eq!(report.confidence_tier(), ConfidenceTier::Low);
}

#[test]
fn test_confidence_tiers() {
    assert_eq!(
        ValidationReport::from_outcomes(outcomes(4, 1)).confidence_tier(),
        ConfidenceTier::High
    );
    assert_eq!(
        ValidationReport::from_outcomes(outcomes(1, 1)).confidence_tier(),
        ConfidenceTier::Medium
    );
    assert_eq!(
        ValidationReport::from_outcomes(outcomes(1, 2)).confidence_tier(),
        ConfidenceTier::Low
    );
    assert_eq!(ConfidenceTier::from_ratio(0.79), ConfidenceTier::Medium);
    assert_eq!(ConfidenceTier::from_ratio(0.49), ConfidenceTier::Low);
}

#[test]
fn test_failure_outcome_keeps_message() {
    let report = ValidationReport::from_outcomes(outcomes(0, 1));
    assert!(!report.outcomes[0].ok);
    assert_eq!(report.outcomes[0].error.as_deref(), Some("Element is not visible"));
    assert!(report.outcomes[0].result.is_none());
}

// ============================================================================
// Advisory note
// ============================================================================

#[test]
fn test_advisory_note_with_results() {
    let note = ValidationReport::from_outcomes(outcomes(3, 1)).advisory_note();
    assert_eq!(note, "Validated 3/4 suggested actions (75%): medium confidence.");
}

#[test]
fn test_advisory_note_when_skipped() {
    let report = ValidationReport::from_outcomes(vec![]).with_skipped("server not reachable");
    assert_eq!(report.advisory_note(), "Action validation skipped: server not reachable");
}

#[test]
fn test_advisory_note_when_nothing_validated() {
    let report = ValidationReport::from_outcomes(vec![])
        .with_candidates_found(2)
        .with_unmatched(vec![candidate("#x"), candidate("#y")]);
    let note = report.advisory_note();
    assert!(note.contains("2 found"));
    assert!(note.contains("2 without a matching element"));
}

// ============================================================================
// Serialization
// ============================================================================

#[test]
fn test_report_json_shape() {
    let report = ValidationReport::from_outcomes(outcomes(1, 0)).with_candidates_found(1);
    let value = serde_json::to_value(&report).unwrap();

    assert_eq!(value["total_actions"], 1);
    assert_eq!(value["outcomes"][0]["action"]["ref"], "e0");
    assert_eq!(value["outcomes"][0]["action"]["strategy"], "exact_selector");
    assert_eq!(value["outcomes"][0]["action"]["candidate"]["selectorHint"], "#ok0");
    assert!(value.get("skipped_reason").is_none());
}

#[test]
fn test_inconsistent_counts_from_json_do_not_underflow() {
    let report: ValidationReport = serde_json::from_value(json!({
        "total_actions": 0,
        "successful_actions": 2,
        "outcomes": []
    }))
    .unwrap();
    assert_eq!(report.failed_actions(), 0);
    assert_eq!(report.success_ratio(), 0.0);

    let report: ValidationReport = serde_json::from_value(json!({
        "total_actions": 1,
        "successful_actions": 3,
        "outcomes": []
    }))
    .unwrap();
    assert_eq!(report.failed_actions(), 0);
    assert_eq!(report.success_ratio(), 1.0);
    assert_eq!(report.confidence_tier(), ConfidenceTier::High);
}

// ============================================================================
// Console rendering
// ============================================================================

#[test]
fn test_console_report_lists_outcomes() {
    let report = ValidationReport::from_outcomes(outcomes(1, 1))
        .with_candidates_found(3)
        .with_rejections(vec![Rejection {
            candidate: candidate("#drop"),
            reason: RejectionReason::DestructiveVerb {
                verb: "drop".into(),
            },
        }]);
    let text = format_console_report(&report);

    assert!(text.contains("=== Action Validation: 3 candidates found ==="));
    assert!(text.contains("\u{2713} PASS  click '#ok0' -> e0 [exact selector]"));
    assert!(text.contains("\u{2717} FAIL  click '#bad0' -> f0 [exact selector]"));
    assert!(text.contains("[ERROR] Element is not visible"));
    assert!(text.contains("SKIP  click '#drop'"));
    assert!(text.contains("=== Results: 1/2 actions validated (50%), medium confidence ==="));
}

#[test]
fn test_console_report_skipped() {
    let report = ValidationReport::from_outcomes(vec![]).with_skipped("launch failed");
    let text = format_console_report(&report);
    assert!(text.contains("[SKIPPED] launch failed"));
    assert!(text.contains("=== Results: 0/0 actions validated ==="));
}

#[test]
fn test_format_plan() {
    let candidates = vec![candidate("#save"), candidate("#delete")];
    let plan = ValidationPlan {
        candidates_found: 2,
        filtered: SafetyFilter::default().filter(&candidates),
    };
    let text = format_plan(&plan);
    assert!(text.contains("+  0.40  click '#save'"));
    assert!(text.contains("-  0.40  click '#delete'"));
    assert!(text.contains("=== 1 accepted, 1 rejected ==="));
}
