//! Briefplan - conversational project planning assistant
//!
//! CLI entry point for the HTTP API and the terminal conversation.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{info, warn};

use briefplan::catalog::{self, CatalogSource, EmptyCatalog};
use briefplan::chat::ChatSession;
use briefplan::cli::{Cli, Command, get_log_path};
use briefplan::config::Config;
use briefplan::llm::{self, LlmClient};
use briefplan::planning::{BreakdownOrchestrator, ProjectContext};
use briefplan::prompts::PromptBuilder;
use briefplan::server::{self, AppState};

fn setup_logging(log_level: Option<&str>) -> Result<()> {
    let log_path = get_log_path();
    let log_dir = log_path.parent().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Write to the log file only; stdout belongs to the conversation
    let level = match log_level.map(|l| l.to_lowercase()) {
        Some(l) if l == "trace" => tracing::Level::TRACE,
        Some(l) if l == "debug" => tracing::Level::DEBUG,
        Some(l) if l == "warn" => tracing::Level::WARN,
        Some(l) if l == "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    };
    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {})", level);
    Ok(())
}

/// Build the catalog source, falling back to no options when unconfigured
fn build_catalog(config: &Config) -> Arc<dyn CatalogSource> {
    match catalog::create_catalog(&config.catalog) {
        Ok(source) => source,
        Err(e) => {
            warn!(error = %e, "Catalog unavailable, prompts will carry no options");
            Arc::new(EmptyCatalog)
        }
    }
}

fn build_llm(config: &Config) -> Result<Arc<dyn LlmClient>> {
    config.validate()?;
    llm::create_client(&config.llm).context("Failed to create LLM client")
}

fn build_prompts(config: &Config) -> Result<Arc<PromptBuilder>> {
    let prompts = PromptBuilder::new(config.prompts_dir.as_deref()).context("Failed to load prompt templates")?;
    Ok(Arc::new(prompts))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // CLI flag wins over the config file
    let log_level = cli
        .log_level
        .clone()
        .or_else(|| Config::load_log_level(cli.config.as_ref()));
    setup_logging(log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(
        "Briefplan loaded config: question model={}, breakdown model={}, max turns={}",
        config.llm.question_profile.model, config.llm.breakdown_profile.model, config.dialogue.max_turns
    );

    match cli.command {
        Command::Serve { host, port } => {
            let mut server_config = config.server.clone();
            if let Some(host) = host {
                server_config.host = host;
            }
            if let Some(port) = port {
                server_config.port = port;
            }

            let state = AppState::new(build_llm(&config)?, build_catalog(&config), build_prompts(&config)?, &config);
            println!(
                "{} http://{}:{}",
                "Briefplan listening on".bright_green(),
                server_config.host,
                server_config.port
            );
            server::serve(&server_config, state).await?;
        }
        Command::Chat => {
            let session = ChatSession::new(build_llm(&config)?, build_catalog(&config), build_prompts(&config)?, &config);
            session.run().await?;
        }
        Command::Questions {
            description,
            timeline,
            budget,
        } => {
            let orchestrator = BreakdownOrchestrator::new(
                build_llm(&config)?,
                build_prompts(&config)?,
                config.llm.question_profile.clone(),
                config.llm.breakdown_profile.clone(),
            );
            let options = catalog::fetch_or_empty(build_catalog(&config).as_ref()).await;
            let context = ProjectContext::new(description, timeline, budget);

            let questions = orchestrator
                .initial_questions(&context, &options)
                .await
                .context("Failed to generate follow-up questions")?;
            for (idx, question) in questions.iter().enumerate() {
                println!("{}. {}", idx + 1, question);
            }
        }
    }

    Ok(())
}
