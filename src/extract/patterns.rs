use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use crate::extract::candidate::{ActionKind, SyntaxVariant};

// ============================================================================
// Declarative pattern table
// ============================================================================
//
// Every row is one surface syntax for one action kind. Capture groups are
// named: `sel` (selector hint, always present), `name` (accessible name,
// optional) and `value` (fill value). Rows are tried in table order, which is
// also the tie-break order for candidates of equal confidence.

/// Quote characters accepted around string arguments.
const Q: &str = "['\"`]";
/// Body of a quoted string argument.
const S: &str = "[^'\"`]+";

/// A single row of the table before compilation.
pub struct PatternSpec {
    pub kind: ActionKind,
    pub variant: SyntaxVariant,
    pub template: &'static str,
    pub confidence_delta: f32,
}

/// A compiled row of the table.
#[derive(Debug)]
pub struct ActionPattern {
    pub kind: ActionKind,
    pub variant: SyntaxVariant,
    pub regex: Regex,
    pub confidence_delta: f32,
}

/// Confidence adjustment granted by the syntax a candidate came from.
pub const fn variant_delta(variant: SyntaxVariant) -> f32 {
    match variant {
        SyntaxVariant::Role => 0.30,
        SyntaxVariant::TestId => 0.25,
        SyntaxVariant::Text | SyntaxVariant::Placeholder | SyntaxVariant::Label => 0.20,
        SyntaxVariant::PlainCall | SyntaxVariant::LocatorChain | SyntaxVariant::BareCall => 0.0,
    }
}

// `{Q}` and `{S}` in templates are expanded before compilation; `{ROLE_NAME}`
// is the optional `{ name: '...' }` options object of getByRole.
const ROLE_NAME: &str = r"(?:,\s*\{[^}]*name:\s*{Q}(?P<name>{S}){Q}[^}]*\})?";

const fn row(
    kind: ActionKind,
    variant: SyntaxVariant,
    template: &'static str,
) -> PatternSpec {
    PatternSpec {
        kind,
        variant,
        template,
        confidence_delta: variant_delta(variant),
    }
}

/// The raw table, in match order.
pub const PATTERN_TABLE: &[PatternSpec] = &[
    // ---- click ----
    row(ActionKind::Click, SyntaxVariant::PlainCall, r"page\.click\({Q}(?P<sel>{S}){Q}\)"),
    row(ActionKind::Click, SyntaxVariant::LocatorChain, r"page\.locator\({Q}(?P<sel>{S}){Q}\)\.click\(\)"),
    row(ActionKind::Click, SyntaxVariant::Role, r"page\.getByRole\({Q}(?P<sel>{S}){Q}{ROLE_NAME}\)\.click\(\)"),
    row(ActionKind::Click, SyntaxVariant::Text, r"page\.getByText\({Q}(?P<sel>{S}){Q}\)\.click\(\)"),
    row(ActionKind::Click, SyntaxVariant::TestId, r"page\.getByTestId\({Q}(?P<sel>{S}){Q}\)\.click\(\)"),
    row(ActionKind::Click, SyntaxVariant::BareCall, r"\.click\({Q}(?P<sel>{S}){Q}\)"),
    // ---- fill ----
    row(ActionKind::Fill, SyntaxVariant::PlainCall, r"page\.fill\({Q}(?P<sel>{S}){Q},\s*{Q}(?P<value>{S}){Q}\)"),
    row(ActionKind::Fill, SyntaxVariant::LocatorChain, r"page\.locator\({Q}(?P<sel>{S}){Q}\)\.fill\({Q}(?P<value>{S}){Q}\)"),
    row(ActionKind::Fill, SyntaxVariant::Role, r"page\.getByRole\({Q}(?P<sel>{S}){Q}{ROLE_NAME}\)\.fill\({Q}(?P<value>{S}){Q}\)"),
    row(ActionKind::Fill, SyntaxVariant::TestId, r"page\.getByTestId\({Q}(?P<sel>{S}){Q}\)\.fill\({Q}(?P<value>{S}){Q}\)"),
    row(ActionKind::Fill, SyntaxVariant::Placeholder, r"page\.getByPlaceholder\({Q}(?P<sel>{S}){Q}\)\.fill\({Q}(?P<value>{S}){Q}\)"),
    row(ActionKind::Fill, SyntaxVariant::Label, r"page\.getByLabel\({Q}(?P<sel>{S}){Q}\)\.fill\({Q}(?P<value>{S}){Q}\)"),
    // ---- waitFor ----
    row(ActionKind::WaitFor, SyntaxVariant::PlainCall, r"page\.waitForSelector\({Q}(?P<sel>{S}){Q}"),
    row(ActionKind::WaitFor, SyntaxVariant::LocatorChain, r"page\.locator\({Q}(?P<sel>{S}){Q}\)\.waitFor\("),
    row(ActionKind::WaitFor, SyntaxVariant::Role, r"page\.getByRole\({Q}(?P<sel>{S}){Q}{ROLE_NAME}\)\.waitFor\("),
    row(ActionKind::WaitFor, SyntaxVariant::Text, r"page\.getByText\({Q}(?P<sel>{S}){Q}\)\.waitFor\("),
];

fn expand(template: &str) -> String {
    template
        .replace("{ROLE_NAME}", ROLE_NAME)
        .replace("{Q}", Q)
        .replace("{S}", S)
}

/// Compile the table. Rows that fail to compile are skipped with a warning so
/// extraction degrades instead of failing.
pub fn build_patterns(table: &[PatternSpec]) -> Vec<ActionPattern> {
    table
        .iter()
        .filter_map(|entry| {
            let source = format!("(?i){}", expand(entry.template));
            match Regex::new(&source) {
                Ok(regex) => Some(ActionPattern {
                    kind: entry.kind,
                    variant: entry.variant,
                    regex,
                    confidence_delta: entry.confidence_delta,
                }),
                Err(e) => {
                    warn!(kind = entry.kind.as_str(), "skipping action pattern: {}", e);
                    None
                }
            }
        })
        .collect()
}

pub static ACTION_PATTERNS: LazyLock<Vec<ActionPattern>> =
    LazyLock::new(|| build_patterns(PATTERN_TABLE));
