//! HTTP request boundary
//!
//! Exposes the dialogue and breakdown operations as JSON endpoints. The
//! server keeps no conversation state; distinct conversations never share
//! anything mutable beyond the catalog cache.

use std::sync::Arc;

use axum::{Router, extract::Request};
use eyre::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, info_span};
use uuid::Uuid;

mod routes;

pub use routes::{ApiError, BreakdownResponse, NextQuestionResponse, PlanRequest, QuestionsResponse};

use crate::catalog::CatalogSource;
use crate::config::{Config, ServerConfig};
use crate::llm::{LlmClient, ModelProfile};
use crate::planning::BreakdownOrchestrator;
use crate::prompts::PromptBuilder;

/// Collaborators shared by every request
pub struct AppState {
    pub llm: Arc<dyn LlmClient>,
    pub catalog: Arc<dyn CatalogSource>,
    pub prompts: Arc<PromptBuilder>,
    pub orchestrator: BreakdownOrchestrator,
    pub question_profile: ModelProfile,
    pub max_turns: usize,
}

impl AppState {
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
}

/// Build the API router with CORS and per-request tracing
pub fn router(state: AppState) -> Router {
    routes::api_routes()
        .with_state(Arc::new(state))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            info_span!(
                "request",
                id = %Uuid::now_v7(),
                method = %request.method(),
                uri = %request.uri()
            )
        }))
}

/// Serve the API until Ctrl-C
pub async fn serve(config: &ServerConfig, state: AppState) -> Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context(format!("Failed to bind {}", addr))?;

    info!("Listening on http://{}", addr);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
