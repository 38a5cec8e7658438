//! Briefplan - conversational project planning assistant
//!
//! Briefplan takes a free-text project idea with a timeline and budget, asks
//! a short series of clarifying questions, then has a generative model emit
//! a structured breakdown whose steps split the budget and timeline. The
//! breakdown can be revised from free-text feedback.
//!
//! # Core Concepts
//!
//! - **Bounded dialogue**: at most `max-turns` answered questions, enforced
//!   locally whatever the model replies
//! - **Tolerant decoding**: model output is coerced into a breakdown even
//!   when wrapped in prose or keyed inconsistently
//! - **Stateless boundary**: callers hold the conversation and resend it
//!
//! # Modules
//!
//! - [`planning`] - Dialogue controller, breakdown orchestrator, coercion
//! - [`prompts`] - Prompt templates and rendering
//! - [`llm`] - Completion client trait and OpenAI implementation
//! - [`catalog`] - Allowed service/subservice/deliverable options
//! - [`server`] - HTTP request boundary
//! - [`chat`] - Terminal conversation
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod catalog;
pub mod chat;
pub mod cli;
pub mod config;
pub mod llm;
pub mod planning;
pub mod prompts;
pub mod server;

pub use catalog::{CatalogOption, CatalogSource};
pub use config::Config;
pub use llm::{LlmClient, LlmError};
pub use planning::{
    AnsweredQuestion, Breakdown, BreakdownOrchestrator, BreakdownStep, DialogueController, ProjectContext,
};
pub use prompts::PromptBuilder;
