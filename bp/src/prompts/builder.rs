//! Prompt builder
//!
//! Renders the three completion prompts from project fields, dialogue
//! history and formatted catalog options. Rendering is pure: the same inputs
//! always produce the same text.

use std::path::{Path, PathBuf};

use handlebars::Handlebars;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use super::embedded;
use crate::planning::{AnsweredQuestion, ProjectContext};

/// Exact reply that ends the clarification dialogue
pub const DONE_TOKEN: &str = "DONE";

/// Fixed last question of the opening question list
pub const PRIORITY_QUESTION: &str = "What is your top priority: quality, speed, or affordability?";

/// Question the model appends after every breakdown
pub const FOLLOW_UP_QUESTION: &str = "Would you like to finalize this plan or make more edits?";

/// Upper bound on questions in the opening list
pub const MAX_INITIAL_QUESTIONS: usize = 6;

/// Allowed number of steps in a breakdown
pub const MIN_STEPS: usize = 2;
pub const MAX_STEPS: usize = 7;

/// Errors from loading or rendering templates
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Prompt template not found: {0}")]
    NotFound(String),

    #[error("Failed to read prompt {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid prompt template {name}: {source}")]
    Template {
        name: String,
        #[source]
        source: Box<handlebars::TemplateError>,
    },

    #[error("Failed to render prompt {name}: {source}")]
    Render {
        name: String,
        #[source]
        source: Box<handlebars::RenderError>,
    },
}

/// Inputs for the breakdown prompt
#[derive(Debug, Clone)]
pub struct BreakdownPromptInput<'a> {
    pub context: &'a ProjectContext,
    pub formatted_options: &'a str,
    pub history: &'a [AnsweredQuestion],
    /// Revision feedback; empty for first-time generation
    pub feedback: &'a str,
    pub total_days: u64,
    pub timeline_label: &'a str,
    pub budget: &'a str,
}

#[derive(Serialize)]
struct InitialQuestionsVars<'a> {
    description: &'a str,
    timeline: &'a str,
    budget: &'a str,
    options: &'a str,
    max_questions: usize,
    priority_question: &'a str,
}

#[derive(Serialize)]
struct NextQuestionVars<'a> {
    description: &'a str,
    timeline: &'a str,
    budget: &'a str,
    history: String,
    max_turns: usize,
    done_token: &'a str,
}

#[derive(Serialize)]
struct BreakdownVars<'a> {
    description: &'a str,
    budget: &'a str,
    options: &'a str,
    history: String,
    feedback: &'a str,
    total_days: u64,
    timeline_label: &'a str,
    min_steps: usize,
    max_steps: usize,
    follow_up: &'a str,
}

/// Renders prompts from registered Handlebars templates
pub struct PromptBuilder {
    hbs: Handlebars<'static>,
}

impl PromptBuilder {
    /// Builder using only the embedded templates
    pub fn embedded() -> Result<Self, PromptError> {
        Self::new(None)
    }

    /// Builder that prefers `{dir}/{name}.pmt` over the embedded template
    pub fn new(override_dir: Option<&Path>) -> Result<Self, PromptError> {
        debug!(?override_dir, "PromptBuilder::new: called");
        let mut hbs = Handlebars::new();
        hbs.register_escape_fn(handlebars::no_escape);

        for name in embedded::TEMPLATE_NAMES {
            let source = load_template(name, override_dir)?;
            hbs.register_template_string(name, source)
                .map_err(|e| PromptError::Template {
                    name: name.to_string(),
                    source: Box::new(e),
                })?;
        }

        Ok(Self { hbs })
    }

    fn render<T: Serialize>(&self, name: &str, vars: &T) -> Result<String, PromptError> {
        let text = self.hbs.render(name, vars).map_err(|e| PromptError::Render {
            name: name.to_string(),
            source: Box::new(e),
        })?;
        debug!(%name, len = text.len(), "PromptBuilder::render: rendered");
        Ok(text)
    }

    /// Opening prompt asking for a numbered list of clarification questions
    pub fn initial_questions(&self, context: &ProjectContext, formatted_options: &str) -> Result<String, PromptError> {
        self.render(
            "initial-questions",
            &InitialQuestionsVars {
                description: &context.description,
                timeline: &context.timeline_text,
                budget: &context.budget_text,
                options: formatted_options,
                max_questions: MAX_INITIAL_QUESTIONS,
                priority_question: PRIORITY_QUESTION,
            },
        )
    }

    /// Prompt for exactly one next question, or the done token
    pub fn next_question(
        &self,
        context: &ProjectContext,
        history: &[AnsweredQuestion],
        max_turns: usize,
    ) -> Result<String, PromptError> {
        self.render(
            "next-question",
            &NextQuestionVars {
                description: &context.description,
                timeline: &context.timeline_text,
                budget: &context.budget_text,
                history: format_history(history),
                max_turns,
                done_token: DONE_TOKEN,
            },
        )
    }

    /// Prompt for a full breakdown; non-empty feedback adds the revision clause
    pub fn breakdown(&self, input: &BreakdownPromptInput<'_>) -> Result<String, PromptError> {
        self.render(
            "breakdown",
            &BreakdownVars {
                description: &input.context.description,
                budget: input.budget,
                options: input.formatted_options,
                history: format_history(input.history),
                feedback: input.feedback.trim(),
                total_days: input.total_days,
                timeline_label: input.timeline_label,
                min_steps: MIN_STEPS,
                max_steps: MAX_STEPS,
                follow_up: FOLLOW_UP_QUESTION,
            },
        )
    }
}

fn load_template(name: &str, override_dir: Option<&Path>) -> Result<String, PromptError> {
    if let Some(dir) = override_dir {
        let path = dir.join(format!("{}.pmt", name));
        if path.exists() {
            info!("Using prompt override {}", path.display());
            return std::fs::read_to_string(&path).map_err(|source| PromptError::Read { path, source });
        }
        debug!(?path, "load_template: no override");
    }

    embedded::get_embedded(name)
        .map(str::to_string)
        .ok_or_else(|| PromptError::NotFound(name.to_string()))
}

/// Serialize answered questions as numbered `Qn:`/`An:` line pairs
pub fn format_history(history: &[AnsweredQuestion]) -> String {
    history
        .iter()
        .enumerate()
        .map(|(idx, qa)| format!("Q{n}: {}\nA{n}: {}", qa.question, qa.answer, n = idx + 1))
        .collect::<Vec<_>>()
        .join("\n")
}
