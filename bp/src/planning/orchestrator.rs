//! Breakdown generation and revision
//!
//! Assembles catalog options, dialogue history and optional feedback into a
//! breakdown prompt, runs it through the capable model profile and coerces
//! the reply. First-time generation and revision share one path; revision
//! only differs by carrying non-empty feedback.

use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::breakdown::Breakdown;
use super::coerce::{CoercionError, coerce};
use super::time::{format_days, normalize_to_days};
use super::{AnsweredQuestion, ProjectContext};
use crate::catalog::{CatalogOption, format_options};
use crate::llm::{LlmClient, LlmError, ModelProfile, complete};
use crate::prompts::{BreakdownPromptInput, PromptBuilder, PromptError};

static NUMBERED_ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\n)\s*\d+\.\s*").expect("numbered item regex is valid"));

/// Hard failure of a generation request
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Completion unavailable: {0}")]
    CompletionUnavailable(#[from] LlmError),

    #[error("Could not decode breakdown: {0}")]
    CoercionFailed(#[from] CoercionError),

    #[error(transparent)]
    Prompt(#[from] PromptError),
}

/// Soft condition reported alongside a usable breakdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakdownWarning {
    /// The payload decoded but held no steps
    EmptyBreakdown,
}

impl fmt::Display for BreakdownWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BreakdownWarning::EmptyBreakdown => write!(f, "no steps found"),
        }
    }
}

/// A freshly generated breakdown plus any soft warnings
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedBreakdown {
    pub breakdown: Breakdown,
    pub warnings: Vec<BreakdownWarning>,
}

/// Turns project context and dialogue history into breakdowns
pub struct BreakdownOrchestrator {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptBuilder>,
    question_profile: ModelProfile,
    breakdown_profile: ModelProfile,
}

impl BreakdownOrchestrator {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        prompts: Arc<PromptBuilder>,
        question_profile: ModelProfile,
        breakdown_profile: ModelProfile,
    ) -> Self {
        Self {
            llm,
            prompts,
            question_profile,
            breakdown_profile,
        }
    }

    /// Generate a breakdown, or revise one when `feedback` is non-empty
    ///
    /// Makes exactly one completion call and never retries.
    pub async fn generate(
        &self,
        context: &ProjectContext,
        options: &[CatalogOption],
        history: &[AnsweredQuestion],
        feedback: &str,
    ) -> Result<GeneratedBreakdown, GenerationError> {
        debug!(
            options = options.len(),
            turns = history.len(),
            revision = !feedback.trim().is_empty(),
            "BreakdownOrchestrator::generate: called"
        );

        let total_days = normalize_to_days(&context.timeline_text);
        let timeline_label = format_days(total_days);
        let formatted_options = format_options(options);

        let prompt = self.prompts.breakdown(&BreakdownPromptInput {
            context,
            formatted_options: &formatted_options,
            history,
            feedback,
            total_days,
            timeline_label: &timeline_label,
            budget: &context.budget_text,
        })?;

        let raw = complete(&self.llm, prompt, &self.breakdown_profile).await?;
        let breakdown = coerce(&raw).inspect_err(|e| warn!(error = %e, "Breakdown coercion failed"))?;

        let mut warnings = Vec::new();
        if breakdown.is_empty() {
            warn!("Generated breakdown has no steps");
            warnings.push(BreakdownWarning::EmptyBreakdown);
        }

        info!(
            steps = breakdown.steps.len(),
            total_days,
            "Breakdown generated"
        );
        Ok(GeneratedBreakdown { breakdown, warnings })
    }

    /// Ask for the opening list of clarification questions
    pub async fn initial_questions(
        &self,
        context: &ProjectContext,
        options: &[CatalogOption],
    ) -> Result<Vec<String>, GenerationError> {
        debug!(options = options.len(), "BreakdownOrchestrator::initial_questions: called");
        let prompt = self
            .prompts
            .initial_questions(context, &format_options(options))?;
        let raw = complete(&self.llm, prompt, &self.question_profile).await?;

        let questions = split_numbered(&raw);
        debug!(count = questions.len(), "BreakdownOrchestrator::initial_questions: split");
        Ok(questions)
    }
}

/// Split a numbered list reply into its items
///
/// Number markers are removed; text before the first marker is kept as its
/// own item. Blank fragments are dropped.
pub fn split_numbered(text: &str) -> Vec<String> {
    NUMBERED_ITEM_RE
        .split(text)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
