use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One node of a page-structure snapshot supplied by the automation server.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StructuralElement {
    /// Opaque reference the server accepts back in action calls.
    /// Empty when the server sent no ref; such elements never match.
    #[serde(rename = "ref", default)]
    pub element_ref: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    #[serde(
        default,
        deserialize_with = "scalar_attributes",
        skip_serializing_if = "HashMap::is_empty"
    )]
    pub attributes: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Accept attribute maps whose values are any JSON scalar.
///
/// Strings pass through, numbers and booleans are rendered as text, and
/// nulls, arrays and objects are dropped.
fn scalar_attributes<'de, D>(deserializer: D) -> Result<HashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<HashMap<String, Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::String(s) => Some((key, s)),
            Value::Bool(b) => Some((key, b.to_string())),
            Value::Number(n) => Some((key, n.to_string())),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        })
        .collect())
}

impl StructuralElement {
    pub fn new(element_ref: &str) -> Self {
        Self {
            element_ref: element_ref.to_string(),
            ..Default::default()
        }
    }

    pub fn with_role(mut self, role: &str) -> Self {
        self.role = Some(role.to_string());
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn with_selector(mut self, selector: &str) -> Self {
        self.selector = Some(selector.to_string());
        self
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn with_attribute(mut self, key: &str, value: &str) -> Self {
        self.attributes.insert(key.to_string(), value.to_string());
        self
    }

    /// Attribute value, treating empty strings as absent.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

/// Point-in-time view of a page's interactive elements.
///
/// Scoped to one validation pass. `total_elements` is set when the element
/// list was cut down for size.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StructuralSnapshot {
    pub elements: Vec<StructuralElement>,
    #[serde(default, rename = "total", skip_serializing_if = "Option::is_none")]
    pub total_elements: Option<usize>,
}

impl StructuralSnapshot {
    pub fn new(elements: Vec<StructuralElement>) -> Self {
        Self {
            elements,
            total_elements: None,
        }
    }

    /// Parse the result of a `browser_snapshot` call. Returns `None` when the
    /// payload has no `elements` array.
    pub fn from_value(value: &Value) -> Option<Self> {
        value.get("elements")?.as_array()?;
        serde_json::from_value(value.clone()).ok()
    }

    /// Keep at most `max` elements, remembering how many there were.
    pub fn truncated(mut self, max: usize) -> Self {
        let total = self.elements.len();
        if total > max {
            self.elements.truncate(max);
            self.total_elements = Some(self.total_elements.unwrap_or(total).max(total));
        }
        self
    }

    pub fn is_truncated(&self) -> bool {
        self.total_elements
            .is_some_and(|total| total > self.elements.len())
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn contains_ref(&self, element_ref: &str) -> bool {
        self.elements.iter().any(|e| e.element_ref == element_ref)
    }
}
