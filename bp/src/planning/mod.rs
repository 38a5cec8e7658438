//! Planning core
//!
//! The clarification dialogue, breakdown generation and the helpers they
//! share: duration normalization and tolerant decoding of model output.

mod breakdown;
mod coerce;
pub(crate) mod context;
pub mod dialogue;
mod orchestrator;
pub mod time;

pub use breakdown::{Breakdown, BreakdownStep};
pub use coerce::{CoercionError, STEP_LIST_KEYS, coerce};
pub use context::{AnsweredQuestion, ProjectContext};
pub use dialogue::{
    DialogueController, DialogueError, DialoguePhase, DialogueState, DialogueStep, InvalidAnswer, NextQuestion,
    next_question, validate_answer,
};
pub use orchestrator::{BreakdownOrchestrator, BreakdownWarning, GeneratedBreakdown, GenerationError, split_numbered};
pub use time::{DEFAULT_TOTAL_DAYS, format_days, normalize_to_days};
