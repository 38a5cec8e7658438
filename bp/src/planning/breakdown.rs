//! Structured project breakdown produced by generation
//!
//! Every field keeps the exact JSON value the model emitted, so a decoded
//! breakdown re-serializes key-for-key. Text conversion happens only when
//! reading a field for display.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// The structured project plan: top-level totals plus ordered steps
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakdown {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub project_name: Option<Value>,

    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub project_description: Option<Value>,

    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub total_project_timeline: Option<Value>,

    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub total_budget: Option<Value>,

    #[serde(default)]
    pub steps: Vec<BreakdownStep>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One step of a breakdown
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownStep {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub step: Option<Value>,

    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub brief_name: Option<Value>,

    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub brief_description: Option<Value>,

    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub service: Option<Value>,

    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub subservice: Option<Value>,

    /// A single text or a list of texts
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub deliverables: Option<Value>,

    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub timeline: Option<Value>,

    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<Value>,

    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub overall_project_description: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Breakdown {
    /// True when no steps were found in the generated payload
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn project_name(&self) -> Option<String> {
        text(&self.project_name)
    }

    pub fn project_description(&self) -> Option<String> {
        text(&self.project_description)
    }

    pub fn total_project_timeline(&self) -> Option<String> {
        text(&self.total_project_timeline)
    }

    pub fn total_budget(&self) -> Option<String> {
        text(&self.total_budget)
    }

    /// Plain-text rendering for terminal display
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("{}\n", self.project_name().unwrap_or_else(|| "Untitled Project".to_string())));
        out.push_str(&format!("Description: {}\n", or_dash(self.project_description())));
        out.push_str(&format!("Timeline: {}\n", or_dash(self.total_project_timeline())));
        out.push_str(&format!("Budget: {}\n", or_dash(self.total_budget())));

        if self.steps.is_empty() {
            out.push_str("\nNo briefs (steps) found in the response.\n");
            return out;
        }

        for (idx, step) in self.steps.iter().enumerate() {
            let ordinal = step.ordinal().unwrap_or_else(|| (idx + 1).to_string());
            let overall = step.overall_project_description().or_else(|| self.project_description());
            out.push('\n');
            out.push_str(&format!(
                "{}: {}\n",
                ordinal,
                step.brief_name().unwrap_or_else(|| "Untitled Step".to_string())
            ));
            out.push_str(&format!("  Brief Description: {}\n", or_dash(text(&step.brief_description))));
            out.push_str(&format!("  Service: {}\n", or_dash(text(&step.service))));
            out.push_str(&format!("  Subservice: {}\n", or_dash(text(&step.subservice))));
            out.push_str(&format!("  Deliverables: {}\n", or_dash(step.deliverables_text())));
            out.push_str(&format!("  Timeline: {}\n", or_dash(text(&step.timeline))));
            out.push_str(&format!("  Cost: {}\n", or_dash(text(&step.estimated_cost))));
            out.push_str(&format!("  Overall Project Description: {}\n", or_dash(overall)));
        }
        out
    }
}

impl BreakdownStep {
    /// Step label as emitted, e.g. `1` or `Step 1`
    pub fn ordinal(&self) -> Option<String> {
        text(&self.step)
    }

    pub fn brief_name(&self) -> Option<String> {
        text(&self.brief_name)
    }

    pub fn overall_project_description(&self) -> Option<String> {
        text(&self.overall_project_description)
    }

    /// Deliverables joined with ", " when emitted as a list
    pub fn deliverables_text(&self) -> Option<String> {
        match &self.deliverables {
            Some(Value::Array(items)) => Some(items.iter().filter_map(value_text).collect::<Vec<_>>().join(", ")),
            other => text(other),
        }
    }
}

/// Distinguish an explicit `null` from an absent key
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

fn text(value: &Option<Value>) -> Option<String> {
    value.as_ref().and_then(value_text)
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

fn or_dash(value: Option<String>) -> String {
    value.filter(|s| !s.is_empty()).unwrap_or_else(|| "-".to_string())
}
