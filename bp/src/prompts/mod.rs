//! Prompt templates
//!
//! Handlebars templates compiled into the binary, optionally overridden from
//! a directory of `.pmt` files.

mod builder;
pub mod embedded;

pub use builder::{
    BreakdownPromptInput, DONE_TOKEN, FOLLOW_UP_QUESTION, MAX_INITIAL_QUESTIONS, MAX_STEPS, MIN_STEPS,
    PRIORITY_QUESTION, PromptBuilder, PromptError, format_history,
};
