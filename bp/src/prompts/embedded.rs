//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// Opening multi-question prompt
pub const INITIAL_QUESTIONS: &str = include_str!("../../prompts/initial-questions.pmt");

/// Single next-question prompt for the clarification dialogue
pub const NEXT_QUESTION: &str = include_str!("../../prompts/next-question.pmt");

/// Breakdown generation and revision prompt
pub const BREAKDOWN: &str = include_str!("../../prompts/breakdown.pmt");

/// Names of all embedded templates
pub const TEMPLATE_NAMES: [&str; 3] = ["initial-questions", "next-question", "breakdown"];

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "initial-questions" => Some(INITIAL_QUESTIONS),
        "next-question" => Some(NEXT_QUESTION),
        "breakdown" => Some(BREAKDOWN),
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_name_resolves() {
        for name in TEMPLATE_NAMES {
            assert!(get_embedded(name).is_some(), "missing template {}", name);
        }
    }

    #[test]
    fn test_next_question_mentions_done_token() {
        assert!(NEXT_QUESTION.contains("{{done_token}}"));
        assert!(NEXT_QUESTION.contains("{{history}}"));
    }

    #[test]
    fn test_breakdown_has_feedback_clause() {
        assert!(BREAKDOWN.contains("{{#if feedback}}"));
        assert!(BREAKDOWN.contains("{{total_days}}"));
    }

    #[test]
    fn test_get_embedded_unknown() {
        assert!(get_embedded("unknown-template").is_none());
    }
}
