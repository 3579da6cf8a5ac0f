use serde::{Deserialize, Serialize};

/// The browser action a candidate proposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    Click,
    Fill,
    WaitFor,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Click => "click",
            ActionKind::Fill => "fill",
            ActionKind::WaitFor => "waitFor",
        }
    }
}

/// Surface syntax a candidate was recognized from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyntaxVariant {
    /// `page.click('sel')`, `page.fill('sel', 'v')`, `page.waitForSelector('sel')`
    PlainCall,
    /// `page.locator('sel').click()`
    LocatorChain,
    /// `page.getByRole('button', { name: 'Submit' })...`
    Role,
    /// `page.getByText('Sign in')...`
    Text,
    /// `page.getByTestId('submit')...`
    TestId,
    /// `page.getByPlaceholder('Email')...`
    Placeholder,
    /// `page.getByLabel('Email')...`
    Label,
    /// Bare `.click('sel')` on any receiver
    BareCall,
}

/// An unresolved, text-derived hypothesis about an intended UI action.
///
/// Produced by the extractor and never mutated afterwards; the safety filter
/// and the matcher only read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionCandidate {
    pub kind: ActionKind,
    pub selector_hint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_hint: Option<String>,
    pub variant: SyntaxVariant,
    pub source_span: String,
    pub confidence: f32,
}

/// Uniqueness key: duplicates of the same key collapse to one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CandidateKey {
    pub kind: ActionKind,
    pub selector_hint: String,
    pub value_hint: Option<String>,
}

impl ActionCandidate {
    pub fn key(&self) -> CandidateKey {
        CandidateKey {
            kind: self.kind,
            selector_hint: self.selector_hint.clone(),
            value_hint: self.value_hint.clone(),
        }
    }

    /// Short human-readable label, e.g. `click 'button' (name 'Submit')`.
    pub fn describe(&self) -> String {
        let mut out = format!("{} '{}'", self.kind.as_str(), self.selector_hint);
        if let Some(name) = &self.name_hint {
            out.push_str(&format!(" (name '{}')", name));
        }
        if let Some(value) = &self.value_hint {
            let shown: String = value.chars().take(40).collect();
            out.push_str(&format!(" = '{}'", shown));
        }
        out
    }
}
