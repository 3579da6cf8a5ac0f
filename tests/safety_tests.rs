use action_bridge::extract::candidate::{ActionCandidate, ActionKind, SyntaxVariant};
use action_bridge::extract::extractor::extract;
use action_bridge::safety::filter::{RejectionReason, SafetyConfig, SafetyFilter};

// ============================================================================
// Helper builders
// ============================================================================

fn click(selector: &str, confidence: f32) -> ActionCandidate {
    ActionCandidate {
        kind: ActionKind::Click,
        selector_hint: selector.to_string(),
        value_hint: None,
        name_hint: None,
        variant: SyntaxVariant::PlainCall,
        source_span: format!("page.click('{}')", selector),
        confidence,
    }
}

fn fill(selector: &str, value: &str) -> ActionCandidate {
    ActionCandidate {
        kind: ActionKind::Fill,
        selector_hint: selector.to_string(),
        value_hint: Some(value.to_string()),
        name_hint: None,
        variant: SyntaxVariant::PlainCall,
        source_span: format!("page.fill('{}', '...')", selector),
        confidence: 0.6,
    }
}

// ============================================================================
// Rejections
// ============================================================================

#[test]
fn test_script_value_is_rejected() {
    let candidates = vec![fill("#comment", "<script>alert(1)</script>")];
    let outcome = SafetyFilter::default().filter(&candidates);

    assert!(outcome.accepted.is_empty());
    assert_eq!(outcome.rejected.len(), 1);
    assert_eq!(
        outcome.rejected[0].reason,
        RejectionReason::InjectionMarker {
            marker: "<script".into()
        }
    );
}

#[test]
fn test_javascript_url_is_rejected_case_insensitively() {
    let outcome = SafetyFilter::default().filter(&[fill("#url", "JavaScript:void(0)")]);
    assert_eq!(outcome.rejected.len(), 1);
}

#[test]
fn test_destructive_verb_in_selector() {
    let outcome = SafetyFilter::default().filter(&[click("#delete-account", 0.6)]);
    assert_eq!(outcome.rejected.len(), 1);
    assert_eq!(
        outcome.rejected[0].reason,
        RejectionReason::DestructiveVerb {
            verb: "delete".into()
        }
    );
}

#[test]
fn test_destructive_verb_from_extracted_text() {
    let candidates = extract("page.getByText('Remove item').click()");
    assert_eq!(candidates.len(), 1);

    let outcome = SafetyFilter::default().filter(&candidates);
    assert!(outcome.accepted.is_empty());
    assert!(matches!(
        outcome.rejected[0].reason,
        RejectionReason::DestructiveVerb { ref verb } if verb == "remove"
    ));
}

#[test]
fn test_overlong_fill_rejected_with_warning() {
    let long = "a".repeat(1001);
    let outcome = SafetyFilter::default().filter(&[fill("#bio", &long)]);

    assert!(outcome.accepted.is_empty());
    assert_eq!(
        outcome.rejected[0].reason,
        RejectionReason::OverlongValue {
            length: 1001,
            limit: 1000
        }
    );
    assert!(outcome.warnings.iter().any(|w| w.starts_with("Very long fill value")));
}

#[test]
fn test_overlong_fill_only_warned_when_not_enforced() {
    let filter = SafetyFilter::new(SafetyConfig {
        enforce_fill_length: false,
        ..SafetyConfig::default()
    });
    let long = "a".repeat(1500);
    let outcome = filter.filter(&[fill("#bio", &long)]);

    assert_eq!(outcome.accepted.len(), 1);
    assert!(outcome.rejected.is_empty());
    assert_eq!(outcome.warnings.len(), 1);
}

#[test]
fn test_fill_at_limit_is_fine() {
    let value = "a".repeat(1000);
    let outcome = SafetyFilter::default().filter(&[fill("#bio", &value)]);
    assert_eq!(outcome.accepted.len(), 1);
    assert!(outcome.warnings.is_empty());
}

#[test]
fn test_custom_denylist() {
    let filter = SafetyFilter::new(SafetyConfig {
        denied_verbs: vec!["Logout".into()],
        ..SafetyConfig::default()
    });
    let outcome = filter.filter(&[click("#logout", 0.5), click("#delete", 0.5)]);
    assert_eq!(outcome.rejected.len(), 1);
    assert_eq!(outcome.rejected[0].candidate.selector_hint, "#logout");
    assert_eq!(outcome.accepted[0].selector_hint, "#delete");
}

// ============================================================================
// Warnings
// ============================================================================

#[test]
fn test_low_confidence_warns_but_accepts() {
    let outcome = SafetyFilter::default().filter(&[click("#maybe", 0.2)]);
    assert_eq!(outcome.accepted.len(), 1);
    assert_eq!(outcome.warnings.len(), 1);
    assert!(outcome.warnings[0].starts_with("Low confidence action"));
}

#[test]
fn test_confidence_at_floor_does_not_warn() {
    let outcome = SafetyFilter::default().filter(&[click("#ok", 0.3)]);
    assert!(outcome.warnings.is_empty());
}

// ============================================================================
// Partition properties
// ============================================================================

#[test]
fn test_empty_input_gives_empty_outcome() {
    let outcome = SafetyFilter::default().filter(&[]);
    assert!(outcome.accepted.is_empty());
    assert!(outcome.rejected.is_empty());
    assert!(outcome.warnings.is_empty());
}

#[test]
fn test_accepted_and_rejected_partition_input() {
    let input = vec![
        click("#save", 0.5),
        click("#drop-table", 0.5),
        fill("#name", "Alice"),
        fill("#img", "data:image/png;base64,AAAA"),
        click("#next", 0.1),
    ];
    let outcome = SafetyFilter::default().filter(&input);

    assert_eq!(outcome.accepted.len() + outcome.rejected.len(), input.len());
    for candidate in &input {
        let in_accepted = outcome.accepted.contains(candidate);
        let in_rejected = outcome.rejected.iter().any(|r| &r.candidate == candidate);
        assert!(in_accepted ^ in_rejected, "{:?}", candidate);
    }
    assert_eq!(outcome.accepted.len(), 3);
}

#[test]
fn test_accepted_candidates_are_unchanged() {
    let input = vec![fill("#name", "Alice"), click("#go", 0.9)];
    let outcome = SafetyFilter::default().filter(&input);
    assert_eq!(outcome.accepted, input);
}
