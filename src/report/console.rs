use crate::snapshot::matcher::MatchStrategy;
use crate::validate::orchestrator::ValidationPlan;
use crate::validate::report::ValidationReport;

// ============================================================================
// Console reporter: formatted terminal output
// ============================================================================

/// Format a validation report for terminal output.
///
/// Produces output like:
/// ```text
/// === Action Validation: 2 candidates found ===
///
/// ✓ PASS  click 'button' (name 'Submit') -> e12 [role]
/// ✗ FAIL  fill '#email' = 'a@b.c' -> e4 [exact selector]
///     [ERROR] Element is not editable
///
/// === Results: 1/2 actions validated (50%), medium confidence ===
/// ```
pub fn format_console_report(report: &ValidationReport) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "=== Action Validation: {} candidates found ===\n\n",
        report.candidates_found
    ));

    if let Some(reason) = &report.skipped_reason {
        out.push_str(&format!("[SKIPPED] {}\n", reason));
    }

    for outcome in &report.outcomes {
        let marker = if outcome.ok {
            "\u{2713} PASS"
        } else {
            "\u{2717} FAIL"
        };
        out.push_str(&format!(
            "{}  {} -> {} [{}]\n",
            marker,
            outcome.action.candidate.describe(),
            outcome.action.element_ref,
            strategy_label(outcome.action.strategy)
        ));
        if let Some(error) = &outcome.error {
            out.push_str(&format!("    [ERROR] {}\n", error));
        }
    }

    for rejection in &report.rejections {
        out.push_str(&format!(
            "-  SKIP  {} ({})\n",
            rejection.candidate.describe(),
            rejection.reason
        ));
    }

    for candidate in &report.unmatched {
        out.push_str(&format!(
            "?  MISS  {} (no matching element)\n",
            candidate.describe()
        ));
    }

    for warning in &report.warnings {
        out.push_str(&format!("    [WARN] {}\n", warning));
    }

    out.push_str(&format!(
        "\n=== Results: {}/{} actions validated",
        report.successful_actions, report.total_actions
    ));
    if report.total_actions > 0 {
        out.push_str(&format!(
            " ({:.0}%), {} confidence",
            report.success_ratio() * 100.0,
            report.confidence_tier().as_str()
        ));
    }
    out.push_str(" ===\n");

    out
}

/// Format extraction and filter verdicts without any page involvement.
pub fn format_plan(plan: &ValidationPlan) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "=== Extracted {} candidates ===\n\n",
        plan.candidates_found
    ));

    for candidate in &plan.filtered.accepted {
        out.push_str(&format!(
            "+  {:.2}  {}\n",
            candidate.confidence,
            candidate.describe()
        ));
    }
    for rejection in &plan.filtered.rejected {
        out.push_str(&format!(
            "-  {:.2}  {} ({})\n",
            rejection.candidate.confidence,
            rejection.candidate.describe(),
            rejection.reason
        ));
    }
    for warning in &plan.filtered.warnings {
        out.push_str(&format!("    [WARN] {}\n", warning));
    }

    out.push_str(&format!(
        "\n=== {} accepted, {} rejected ===\n",
        plan.filtered.accepted.len(),
        plan.filtered.rejected.len()
    ));

    out
}

fn strategy_label(strategy: MatchStrategy) -> &'static str {
    match strategy {
        MatchStrategy::ExactSelector => "exact selector",
        MatchStrategy::Role => "role",
        MatchStrategy::Text => "text",
        MatchStrategy::Attribute => "attribute",
        MatchStrategy::Placeholder => "placeholder",
        MatchStrategy::Label => "label",
    }
}
