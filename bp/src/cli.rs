//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Briefplan - conversational project planning assistant
#[derive(Parser)]
#[command(
    name = "bp",
    about = "Turn a project idea into a budgeted, step-by-step breakdown",
    version = env!("CARGO_PKG_VERSION"),
    after_help = "Logs are written to: ~/.local/share/briefplan/logs/briefplan.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true, help = "Log level (trace, debug, info, warn, error)")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Subcommand)]
pub enum Command {
    /// Serve the planning API over HTTP
    Serve {
        /// Address to bind (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Plan a project interactively in the terminal
    Chat,

    /// Print the opening clarification questions for a project
    Questions {
        /// Project description
        description: String,

        /// Target timeline, e.g. "2 months"
        #[arg(short, long, default_value = "")]
        timeline: String,

        /// Total budget, e.g. "$5000"
        #[arg(short, long, default_value = "")]
        budget: String,
    },
}

/// Path of the log file written by the binary
pub fn get_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("briefplan")
        .join("logs")
        .join("briefplan.log")
}
