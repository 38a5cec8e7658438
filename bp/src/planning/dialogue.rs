//! Clarification dialogue
//!
//! Drives the question/answer turns that precede breakdown generation. Each
//! turn asks the completion service for one more question until it replies
//! with the done token or the turn cap is reached. The cap is enforced here,
//! before any completion call, so a model that never says done still ends
//! the dialogue.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::{AnsweredQuestion, ProjectContext};
use crate::llm::{LlmClient, LlmError, ModelProfile, complete};
use crate::prompts::{DONE_TOKEN, PromptBuilder, PromptError};

/// Default hard cap on answered questions
pub const DEFAULT_MAX_TURNS: usize = 5;

/// Shown when an answer fails validation
pub const REPHRASE_MESSAGE: &str = "I didn't quite get that. Could you please rephrase?";

/// Why an answer was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidAnswer {
    #[error("answer is shorter than 2 characters")]
    TooShort,

    #[error("answer is only a number")]
    Numeric,

    #[error("answer looks like gibberish")]
    Gibberish,
}

/// Reject answers that cannot carry meaning
///
/// Applied to the trimmed answer: fewer than 2 characters, only ASCII
/// digits, or 4+ ASCII letters with no vowel.
pub fn validate_answer(answer: &str) -> Result<(), InvalidAnswer> {
    let trimmed = answer.trim();
    if trimmed.chars().count() < 2 {
        return Err(InvalidAnswer::TooShort);
    }
    if trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(InvalidAnswer::Numeric);
    }
    if trimmed.len() >= 4
        && trimmed.chars().all(|c| c.is_ascii_alphabetic())
        && !trimmed.chars().any(|c| matches!(c.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u'))
    {
        return Err(InvalidAnswer::Gibberish);
    }
    Ok(())
}

/// True when a completion reply is the done token
pub fn is_done_token(reply: &str) -> bool {
    reply.trim().eq_ignore_ascii_case(DONE_TOKEN)
}

#[derive(Debug, Error)]
pub enum DialogueError {
    #[error("No question is awaiting an answer (dialogue is {0})")]
    NotAwaitingAnswer(&'static str),

    #[error("Failed to build question prompt: {0}")]
    Prompt(#[from] PromptError),

    #[error("Next question unavailable: {0}")]
    CompletionUnavailable(#[from] LlmError),
}

/// Outcome of asking for the next question
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextQuestion {
    Ask(String),
    Done,
}

/// Ask for the question that follows `history`, or decide the dialogue is over
///
/// Makes no completion call once `history` holds `max_turns` answers.
pub async fn next_question(
    llm: &Arc<dyn LlmClient>,
    prompts: &PromptBuilder,
    context: &ProjectContext,
    history: &[AnsweredQuestion],
    max_turns: usize,
    profile: &ModelProfile,
) -> Result<NextQuestion, DialogueError> {
    debug!(turns = history.len(), max_turns, "next_question: called");
    if history.len() >= max_turns {
        info!(turns = history.len(), "Turn cap reached, dialogue complete");
        return Ok(NextQuestion::Done);
    }

    let prompt = prompts.next_question(context, history, max_turns)?;
    let reply = complete(llm, prompt, profile).await?;

    if is_done_token(&reply) {
        info!(turns = history.len(), "Model signalled done");
        return Ok(NextQuestion::Done);
    }

    let question = reply.trim();
    if question.is_empty() {
        return Err(LlmError::InvalidResponse("empty question".to_string()).into());
    }
    Ok(NextQuestion::Ask(question.to_string()))
}

/// Context plus the answered questions so far
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueState {
    pub context: ProjectContext,
    pub history: Vec<AnsweredQuestion>,
}

impl DialogueState {
    pub fn new(context: ProjectContext) -> Self {
        Self {
            context,
            history: Vec::new(),
        }
    }

    pub fn turn_count(&self) -> usize {
        self.history.len()
    }
}

/// Where the dialogue is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialoguePhase {
    /// No question requested yet
    Initial,
    /// A question is out and waiting for its answer
    AwaitingAnswer { question: String },
    /// The last answer was recorded but fetching the next question failed
    Interrupted,
    /// No further questions
    Complete,
}

impl DialoguePhase {
    fn name(&self) -> &'static str {
        match self {
            DialoguePhase::Initial => "not started",
            DialoguePhase::AwaitingAnswer { .. } => "awaiting an answer",
            DialoguePhase::Interrupted => "interrupted",
            DialoguePhase::Complete => "complete",
        }
    }
}

/// What the caller should show next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogueStep {
    Question(String),
    /// The answer was rejected; the same question stays open
    Rephrase { question: String, reason: InvalidAnswer },
    Complete,
}

/// State machine for one conversation's clarification dialogue
///
/// Mutation goes through `&mut self`, so one controller only ever has one
/// turn in flight.
pub struct DialogueController {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptBuilder>,
    profile: ModelProfile,
    max_turns: usize,
    state: DialogueState,
    phase: DialoguePhase,
}

impl DialogueController {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        prompts: Arc<PromptBuilder>,
        profile: ModelProfile,
        context: ProjectContext,
        max_turns: usize,
    ) -> Self {
        debug!(max_turns, "DialogueController::new: called");
        Self {
            llm,
            prompts,
            profile,
            max_turns,
            state: DialogueState::new(context),
            phase: DialoguePhase::Initial,
        }
    }

    pub fn phase(&self) -> &DialoguePhase {
        &self.phase
    }

    pub fn state(&self) -> &DialogueState {
        &self.state
    }

    pub fn history(&self) -> &[AnsweredQuestion] {
        &self.state.history
    }

    pub fn turn_count(&self) -> usize {
        self.state.turn_count()
    }

    pub fn is_complete(&self) -> bool {
        self.phase == DialoguePhase::Complete
    }

    pub fn into_state(self) -> DialogueState {
        self.state
    }

    /// Fetch the first question, or retry after an interruption
    ///
    /// While a question is already open it is returned again without a
    /// completion call.
    pub async fn request_question(&mut self) -> Result<DialogueStep, DialogueError> {
        debug!(phase = self.phase.name(), "DialogueController::request_question: called");
        match &self.phase {
            DialoguePhase::AwaitingAnswer { question } => return Ok(DialogueStep::Question(question.clone())),
            DialoguePhase::Complete => return Ok(DialogueStep::Complete),
            DialoguePhase::Initial | DialoguePhase::Interrupted => {}
        }
        self.advance().await
    }

    /// Answer the open question
    ///
    /// A rejected answer leaves the turn count untouched. An accepted one is
    /// appended to history before the next question is requested, so it is
    /// kept even when that request fails.
    pub async fn submit_answer(&mut self, answer: &str) -> Result<DialogueStep, DialogueError> {
        debug!(answer_len = answer.len(), "DialogueController::submit_answer: called");
        let DialoguePhase::AwaitingAnswer { question } = &self.phase else {
            return Err(DialogueError::NotAwaitingAnswer(self.phase.name()));
        };

        if let Err(reason) = validate_answer(answer) {
            debug!(%reason, "DialogueController::submit_answer: rejected");
            return Ok(DialogueStep::Rephrase {
                question: question.clone(),
                reason,
            });
        }

        let question = question.clone();
        self.state
            .history
            .push(AnsweredQuestion::new(question, answer.trim()));
        info!(turn = self.turn_count(), max_turns = self.max_turns, "Answer recorded");

        self.advance().await
    }

    async fn advance(&mut self) -> Result<DialogueStep, DialogueError> {
        let outcome = next_question(
            &self.llm,
            &self.prompts,
            &self.state.context,
            &self.state.history,
            self.max_turns,
            &self.profile,
        )
        .await;

        match outcome {
            Ok(NextQuestion::Ask(question)) => {
                self.phase = DialoguePhase::AwaitingAnswer {
                    question: question.clone(),
                };
                Ok(DialogueStep::Question(question))
            }
            Ok(NextQuestion::Done) => {
                self.phase = DialoguePhase::Complete;
                Ok(DialogueStep::Complete)
            }
            Err(e) => {
                warn!(error = %e, turn = self.turn_count(), "Dialogue interrupted");
                self.phase = DialoguePhase::Interrupted;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::mock::{MockLlmClient, MockReply};

    fn bakery() -> ProjectContext {
        ProjectContext::new("A bakery delivery app", "2 months", "$5000")
    }

    fn controller(mock: Arc<MockLlmClient>, max_turns: usize) -> DialogueController {
        DialogueController::new(
            mock,
            Arc::new(PromptBuilder::embedded().unwrap()),
            ModelProfile::fast(),
            bakery(),
            max_turns,
        )
    }

    #[test]
    fn test_validate_answer() {
        assert_eq!(validate_answer("42"), Err(InvalidAnswer::Numeric));
        assert_eq!(validate_answer(" 7 "), Err(InvalidAnswer::TooShort));
        assert_eq!(validate_answer("x"), Err(InvalidAnswer::TooShort));
        assert_eq!(validate_answer("   "), Err(InvalidAnswer::TooShort));
        assert_eq!(validate_answer("bcdfg"), Err(InvalidAnswer::Gibberish));
        assert_eq!(validate_answer("QWRTY"), Err(InvalidAnswer::Gibberish));
        assert!(validate_answer("We target small retailers").is_ok());
        assert!(validate_answer("ok").is_ok());
        assert!(validate_answer("xyz").is_ok());
        assert!(validate_answer("rhythm").is_err());
        assert!(validate_answer("gym").is_ok());
        assert!(validate_answer("B2B").is_ok());
    }

    #[test]
    fn test_is_done_token() {
        assert!(is_done_token("DONE"));
        assert!(is_done_token("  done\n"));
        assert!(is_done_token("Done"));
        assert!(!is_done_token("DONE."));
        assert!(!is_done_token("Are we done?"));
    }

    #[tokio::test]
    async fn test_turn_cap_without_done() {
        let mock = Arc::new(MockLlmClient::from_texts(&[
            "Q1?", "Q2?", "Q3?", "Q4?", "Q5?", "Q6?", "Q7?",
        ]));
        let mut dialogue = controller(mock.clone(), DEFAULT_MAX_TURNS);

        let mut step = dialogue.request_question().await.unwrap();
        let mut answered = 0;
        while let DialogueStep::Question(_) = step {
            answered += 1;
            step = dialogue.submit_answer("A clear answer").await.unwrap();
            assert!(dialogue.turn_count() <= DEFAULT_MAX_TURNS);
        }

        assert_eq!(step, DialogueStep::Complete);
        assert_eq!(answered, 5);
        assert_eq!(dialogue.turn_count(), 5);
        assert_eq!(mock.call_count(), 5);
        assert!(dialogue.is_complete());
    }

    #[tokio::test]
    async fn test_done_ends_dialogue_early() {
        let mock = Arc::new(MockLlmClient::from_texts(&["Who buys from you?", " done \n"]));
        let mut dialogue = controller(mock.clone(), DEFAULT_MAX_TURNS);

        assert_eq!(
            dialogue.request_question().await.unwrap(),
            DialogueStep::Question("Who buys from you?".to_string())
        );
        assert_eq!(dialogue.submit_answer("Office workers").await.unwrap(), DialogueStep::Complete);
        assert_eq!(dialogue.history(), &[AnsweredQuestion::new("Who buys from you?", "Office workers")]);
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_done_on_first_request() {
        let mock = Arc::new(MockLlmClient::from_texts(&["DONE"]));
        let mut dialogue = controller(mock.clone(), DEFAULT_MAX_TURNS);

        assert_eq!(dialogue.request_question().await.unwrap(), DialogueStep::Complete);
        assert_eq!(dialogue.turn_count(), 0);
        assert_eq!(dialogue.request_question().await.unwrap(), DialogueStep::Complete);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_zero_max_turns_never_calls() {
        let mock = Arc::new(MockLlmClient::from_texts(&["Q1?"]));
        let mut dialogue = controller(mock.clone(), 0);

        assert_eq!(dialogue.request_question().await.unwrap(), DialogueStep::Complete);
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_answer_does_not_consume_turn() {
        let mock = Arc::new(MockLlmClient::from_texts(&["Q1?", "Q2?"]));
        let mut dialogue = controller(mock.clone(), DEFAULT_MAX_TURNS);
        dialogue.request_question().await.unwrap();

        let step = dialogue.submit_answer("42").await.unwrap();
        assert_eq!(
            step,
            DialogueStep::Rephrase {
                question: "Q1?".to_string(),
                reason: InvalidAnswer::Numeric,
            }
        );
        assert_eq!(dialogue.turn_count(), 0);
        assert_eq!(mock.call_count(), 1);

        let step = dialogue.submit_answer("Families nearby").await.unwrap();
        assert_eq!(step, DialogueStep::Question("Q2?".to_string()));
        assert_eq!(dialogue.turn_count(), 1);
    }

    #[tokio::test]
    async fn test_history_is_sent_with_next_prompt() {
        let mock = Arc::new(MockLlmClient::from_texts(&["Q1?", "Q2?"]));
        let mut dialogue = controller(mock.clone(), DEFAULT_MAX_TURNS);
        dialogue.request_question().await.unwrap();
        dialogue.submit_answer("  Busy parents  ").await.unwrap();

        let prompt = mock.last_prompt().unwrap();
        assert!(prompt.contains("Q1: Q1?\nA1: Busy parents"));
        assert_eq!(mock.requests()[1].profile.model, "gpt-4o");
    }

    #[tokio::test]
    async fn test_failure_interrupts_and_keeps_answer() {
        let mock = Arc::new(MockLlmClient::new(vec![
            MockReply::Text("Q1?".to_string()),
            MockReply::Fail("upstream down".to_string()),
            MockReply::Text("Q2?".to_string()),
        ]));
        let mut dialogue = controller(mock.clone(), DEFAULT_MAX_TURNS);
        dialogue.request_question().await.unwrap();

        let err = dialogue.submit_answer("Commuters").await.unwrap_err();
        assert!(matches!(err, DialogueError::CompletionUnavailable(_)));
        assert_eq!(dialogue.phase(), &DialoguePhase::Interrupted);
        assert_eq!(dialogue.turn_count(), 1);

        // No question is open, so answers are refused until a retry succeeds
        assert!(matches!(
            dialogue.submit_answer("Again").await,
            Err(DialogueError::NotAwaitingAnswer(_))
        ));

        assert_eq!(
            dialogue.request_question().await.unwrap(),
            DialogueStep::Question("Q2?".to_string())
        );
        assert_eq!(dialogue.turn_count(), 1);
    }

    #[tokio::test]
    async fn test_submit_before_first_question_is_error() {
        let mock = Arc::new(MockLlmClient::from_texts(&["Q1?"]));
        let mut dialogue = controller(mock.clone(), DEFAULT_MAX_TURNS);

        assert!(matches!(
            dialogue.submit_answer("Hello there").await,
            Err(DialogueError::NotAwaitingAnswer("not started"))
        ));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_open_question_is_not_refetched() {
        let mock = Arc::new(MockLlmClient::from_texts(&["Q1?", "Q2?"]));
        let mut dialogue = controller(mock.clone(), DEFAULT_MAX_TURNS);

        dialogue.request_question().await.unwrap();
        assert_eq!(
            dialogue.request_question().await.unwrap(),
            DialogueStep::Question("Q1?".to_string())
        );
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_stateless_next_question_respects_cap() {
        let mock = Arc::new(MockLlmClient::from_texts(&["Q6?"]));
        let llm: Arc<dyn LlmClient> = mock.clone();
        let prompts = PromptBuilder::embedded().unwrap();
        let history: Vec<_> = (1..=5)
            .map(|n| AnsweredQuestion::new(format!("Q{}?", n), "An answer"))
            .collect();

        let outcome = next_question(&llm, &prompts, &bakery(), &history, 5, &ModelProfile::fast())
            .await
            .unwrap();
        assert_eq!(outcome, NextQuestion::Done);
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_reply_is_unavailable() {
        let mock = Arc::new(MockLlmClient::from_texts(&["   "]));
        let llm: Arc<dyn LlmClient> = mock;
        let prompts = PromptBuilder::embedded().unwrap();

        let result = next_question(&llm, &prompts, &bakery(), &[], 5, &ModelProfile::fast()).await;
        assert!(matches!(result, Err(DialogueError::CompletionUnavailable(_))));
    }
}
