//! Conversation inputs shared by the dialogue and breakdown generation

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Project fields supplied once when a conversation starts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectContext {
    pub description: String,
    pub timeline_text: String,
    pub budget_text: String,
}

impl ProjectContext {
    pub fn new(description: impl Into<String>, timeline_text: impl Into<String>, budget_text: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            timeline_text: timeline_text.into(),
            budget_text: budget_text.into(),
        }
    }
}

/// One completed dialogue turn
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnsweredQuestion {
    #[serde(default, deserialize_with = "scalar_text")]
    pub question: String,
    #[serde(default, deserialize_with = "scalar_text")]
    pub answer: String,
}

impl AnsweredQuestion {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// Decode any JSON value as text: strings as-is, `null` as empty, other values in JSON form
pub(crate) fn scalar_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}
