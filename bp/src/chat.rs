//! Interactive terminal conversation
//!
//! Collects the project fields, runs the clarification dialogue, then shows
//! the generated breakdown and revises it from feedback until the user
//! finalizes.

use std::sync::{Arc, LazyLock};

use colored::Colorize;
use eyre::Result;
use regex::Regex;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{debug, info};

use crate::catalog::{CatalogSource, fetch_or_empty};
use crate::config::Config;
use crate::llm::{LlmClient, ModelProfile};
use crate::planning::dialogue::REPHRASE_MESSAGE;
use crate::planning::{AnsweredQuestion, BreakdownOrchestrator, DialogueController, DialogueStep, ProjectContext};
use crate::prompts::{FOLLOW_UP_QUESTION, PromptBuilder};

static FINALIZE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)finalize|i'm satisfied").expect("finalize regex is valid"));

/// True when a revision reply means the user accepts the plan
pub fn is_finalize(message: &str) -> bool {
    FINALIZE_RE.is_match(message)
}

/// One line of user input after slash commands are handled
enum Input {
    Text(String),
    Quit,
}

/// Terminal planning conversation
pub struct ChatSession {
    llm: Arc<dyn LlmClient>,
    catalog: Arc<dyn CatalogSource>,
    prompts: Arc<PromptBuilder>,
    orchestrator: BreakdownOrchestrator,
    question_profile: ModelProfile,
    max_turns: usize,
}

impl ChatSession {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        catalog: Arc<dyn CatalogSource>,
        prompts: Arc<PromptBuilder>,
        config: &Config,
    ) -> Self {
        let orchestrator = BreakdownOrchestrator::new(
            llm.clone(),
            prompts.clone(),
            config.llm.question_profile.clone(),
            config.llm.breakdown_profile.clone(),
        );
        Self {
            llm,
            catalog,
            prompts,
            orchestrator,
            question_profile: config.llm.question_profile.clone(),
            max_turns: config.dialogue.max_turns,
        }
    }

    /// Run the conversation until the plan is finalized or the user quits
    pub async fn run(&self) -> Result<()> {
        self.print_welcome();
        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

        let Some(context) = self.collect_context(&mut rl)? else {
            println!("Goodbye!");
            return Ok(());
        };
        info!("Chat started");

        let Some(history) = self.run_dialogue(&mut rl, context.clone()).await? else {
            println!("Goodbye!");
            return Ok(());
        };

        self.run_revisions(&mut rl, &context, &history).await?;
        println!("Goodbye!");
        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", "Briefplan".bright_cyan().bold());
        say("Hello! Tell me your project or idea and I'll help you break it down into briefs.");
        println!("Type {} to list commands, {} to leave", "/help".yellow(), "/quit".yellow());
        println!();
    }

    fn print_help(&self) {
        println!();
        println!("{}", "Available Commands:".bright_cyan());
        println!("  {:14} Show this help", "/help".yellow());
        println!("  {:14} Show answered questions", "/history".yellow());
        println!("  {:14} Exit", "/quit".yellow());
        println!();
    }

    fn print_history(&self, history: &[AnsweredQuestion]) {
        if history.is_empty() {
            println!("{}", "No questions answered yet.".dimmed());
            return;
        }
        println!();
        println!("{}", "Answered Questions:".bright_cyan());
        for (idx, qa) in history.iter().enumerate() {
            println!("  {} {}", format!("Q{}:", idx + 1).bright_blue(), qa.question);
            println!("  {} {}", format!("A{}:", idx + 1).bright_green(), qa.answer);
        }
        println!();
    }

    /// Read one non-empty line, handling slash commands in place
    fn read_input(&self, rl: &mut DefaultEditor, history: &[AnsweredQuestion]) -> Result<Input> {
        loop {
            match rl.readline(&format!("{} ", ">".bright_green())) {
                Ok(line) => {
                    let input = line.trim();
                    if input.is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(input);

                    match input {
                        "/quit" | "/q" | "/exit" => return Ok(Input::Quit),
                        "/help" | "/h" => self.print_help(),
                        "/history" => self.print_history(history),
                        cmd if cmd.starts_with('/') => {
                            println!("{} Unknown command: {}", "?".yellow(), cmd);
                        }
                        text => return Ok(Input::Text(text.to_string())),
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    return Ok(Input::Quit);
                }
                Err(err) => return Err(eyre::eyre!("Readline error: {}", err)),
            }
        }
    }

    fn collect_context(&self, rl: &mut DefaultEditor) -> Result<Option<ProjectContext>> {
        let Input::Text(description) = self.read_input(rl, &[])? else {
            return Ok(None);
        };
        say("Let's align on your project scope. What's your ideal project timeline?");
        let Input::Text(timeline) = self.read_input(rl, &[])? else {
            return Ok(None);
        };
        say("Great! Now, what's your estimated total budget for this project?");
        let Input::Text(budget) = self.read_input(rl, &[])? else {
            return Ok(None);
        };
        Ok(Some(ProjectContext::new(description, timeline, budget)))
    }

    /// Drive the clarification dialogue; `None` when the user quits
    async fn run_dialogue(
        &self,
        rl: &mut DefaultEditor,
        context: ProjectContext,
    ) -> Result<Option<Vec<AnsweredQuestion>>> {
        say("Awesome, thinking of the best questions to clarify your project...");
        let mut dialogue = DialogueController::new(
            self.llm.clone(),
            self.prompts.clone(),
            self.question_profile.clone(),
            context,
            self.max_turns,
        );

        let mut step = dialogue.request_question().await;
        loop {
            match step {
                Ok(DialogueStep::Complete) => break,
                Ok(DialogueStep::Question(question)) => {
                    say(&question);
                    let Input::Text(answer) = self.read_input(rl, dialogue.history())? else {
                        return Ok(None);
                    };
                    step = dialogue.submit_answer(&answer).await;
                }
                Ok(DialogueStep::Rephrase { reason, .. }) => {
                    debug!(%reason, "run_dialogue: answer rejected");
                    say(REPHRASE_MESSAGE);
                    let Input::Text(answer) = self.read_input(rl, dialogue.history())? else {
                        return Ok(None);
                    };
                    step = dialogue.submit_answer(&answer).await;
                }
                Err(e) => {
                    debug!(error = %e, "run_dialogue: question unavailable");
                    apologize("Sorry, I ran into an issue generating the next question.");
                    println!("Type anything to retry, or {} to leave", "/quit".yellow());
                    if let Input::Quit = self.read_input(rl, dialogue.history())? {
                        return Ok(None);
                    }
                    step = dialogue.request_question().await;
                }
            }
        }

        Ok(Some(dialogue.into_state().history))
    }

    /// Generate, show and revise the breakdown until finalized or quit
    async fn run_revisions(
        &self,
        rl: &mut DefaultEditor,
        context: &ProjectContext,
        history: &[AnsweredQuestion],
    ) -> Result<()> {
        say("Generating your project breakdown... This may take a few seconds.");
        let mut feedback = String::new();

        loop {
            let options = fetch_or_empty(self.catalog.as_ref()).await;
            match self.orchestrator.generate(context, &options, history, &feedback).await {
                Ok(generated) => {
                    say("Here's your project breakdown:");
                    println!();
                    println!("{}", generated.breakdown.render_text());
                    for warning in &generated.warnings {
                        println!("{} {}", "!".yellow(), warning);
                    }
                }
                Err(e) => {
                    debug!(error = %e, "run_revisions: generation failed");
                    apologize("Sorry, I couldn't generate the project breakdown.");
                }
            }

            say(FOLLOW_UP_QUESTION);
            let Input::Text(reply) = self.read_input(rl, history)? else {
                return Ok(());
            };
            if is_finalize(&reply) {
                say("Great! Finalizing your plan. Thank you!");
                info!("Plan finalized");
                return Ok(());
            }
            say("Updating your plan as requested...");
            feedback = reply;
        }
    }
}

fn say(text: &str) {
    println!("{} {}", "AI:".bright_blue().bold(), text);
}

fn apologize(text: &str) {
    println!("{} {}", "AI:".bright_blue().bold(), text.red());
}
