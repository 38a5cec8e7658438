//! Request handlers for the planning API
//!
//! Every handler is stateless with respect to the conversation: the caller
//! sends the project fields and all answers so far on each request.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, info, warn};

use super::AppState;
use crate::catalog::fetch_or_empty;
use crate::planning::context::scalar_text;
use crate::planning::{
    AnsweredQuestion, Breakdown, GeneratedBreakdown, GenerationError, NextQuestion, ProjectContext, next_question,
};

type SharedState = Arc<AppState>;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/get-refined-details", post(get_refined_details))
        .route("/api/get-next-question", post(get_next_question))
        .route("/api/get-briefs", post(get_briefs))
        .route("/api/update-briefs", post(update_briefs))
}

/// Body shared by all planning endpoints
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlanRequest {
    #[serde(deserialize_with = "scalar_text")]
    pub user_input: String,
    #[serde(deserialize_with = "scalar_text")]
    pub project_timeline: String,
    #[serde(deserialize_with = "scalar_text")]
    pub project_budget: String,
    pub answers: Option<Vec<AnsweredQuestion>>,
    #[serde(deserialize_with = "scalar_text")]
    pub feedback: String,
}

/// Body extraction that reports a malformed body as `{error}` like every other failure
type PlanBody = Result<Json<PlanRequest>, JsonRejection>;

impl PlanRequest {
    fn from_body(body: PlanBody) -> Result<Self, ApiError> {
        body.map(|Json(req)| req).map_err(|rejection| {
            warn!(error = %rejection, "Rejected request body");
            ApiError {
                status: rejection.status(),
                message: "Invalid request body.",
            }
        })
    }

    fn context(&self) -> ProjectContext {
        ProjectContext::new(&self.user_input, &self.project_timeline, &self.project_budget)
    }

    fn answers(&self) -> &[AnsweredQuestion] {
        self.answers.as_deref().unwrap_or_default()
    }

    fn feedback(&self) -> &str {
        &self.feedback
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum NextQuestionResponse {
    Question { question: String },
    Done { done: bool },
}

#[derive(Debug, Serialize)]
pub struct BreakdownResponse {
    pub breakdown: Breakdown,
    pub warnings: Vec<String>,
}

impl From<GeneratedBreakdown> for BreakdownResponse {
    fn from(generated: GeneratedBreakdown) -> Self {
        Self {
            breakdown: generated.breakdown,
            warnings: generated.warnings.iter().map(ToString::to_string).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct QuestionsResponse {
    pub questions: Vec<String>,
}

/// Failure returned to the caller as `{error: message}` with no partial result
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: &'static str,
}

impl ApiError {
    fn internal(message: &'static str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message,
        }
    }

    fn generation(err: &GenerationError, message: &'static str) -> Self {
        match err {
            GenerationError::CoercionFailed(_) => Self::internal("Invalid breakdown format."),
            _ => Self::internal(message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn get_refined_details(
    State(state): State<SharedState>,
    body: PlanBody,
) -> Result<Json<QuestionsResponse>, ApiError> {
    debug!("get_refined_details: called");
    let req = PlanRequest::from_body(body)?;
    let options = fetch_or_empty(state.catalog.as_ref()).await;

    let questions = state
        .orchestrator
        .initial_questions(&req.context(), &options)
        .await
        .map_err(|e| {
            error!(error = %e, "Error generating follow-up questions");
            ApiError::internal("Sorry, I couldn't generate the follow-up questions. Please try again later.")
        })?;

    Ok(Json(QuestionsResponse { questions }))
}

async fn get_next_question(
    State(state): State<SharedState>,
    body: PlanBody,
) -> Result<Json<NextQuestionResponse>, ApiError> {
    let req = PlanRequest::from_body(body)?;
    debug!(answers = req.answers().len(), "get_next_question: called");

    let outcome = next_question(
        &state.llm,
        &state.prompts,
        &req.context(),
        req.answers(),
        state.max_turns,
        &state.question_profile,
    )
    .await
    .map_err(|e| {
        error!(error = %e, "Error generating next question");
        ApiError::internal("Failed to generate next question")
    })?;

    Ok(Json(match outcome {
        NextQuestion::Ask(question) => NextQuestionResponse::Question { question },
        NextQuestion::Done => NextQuestionResponse::Done { done: true },
    }))
}

async fn get_briefs(
    State(state): State<SharedState>,
    body: PlanBody,
) -> Result<Json<BreakdownResponse>, ApiError> {
    let req = PlanRequest::from_body(body)?;
    debug!(answers = req.answers().len(), "get_briefs: called");
    generate(&state, &req, "", "Failed to generate breakdown").await
}

async fn update_briefs(
    State(state): State<SharedState>,
    body: PlanBody,
) -> Result<Json<BreakdownResponse>, ApiError> {
    let req = PlanRequest::from_body(body)?;
    debug!(feedback_len = req.feedback().len(), "update_briefs: called");
    generate(&state, &req, req.feedback(), "Failed to update breakdown").await
}

async fn generate(
    state: &AppState,
    req: &PlanRequest,
    feedback: &str,
    failure: &'static str,
) -> Result<Json<BreakdownResponse>, ApiError> {
    let options = fetch_or_empty(state.catalog.as_ref()).await;

    let generated = state
        .orchestrator
        .generate(&req.context(), &options, req.answers(), feedback)
        .await
        .map_err(|e| {
            error!(error = %e, "{}", failure);
            ApiError::generation(&e, failure)
        })?;

    info!(
        steps = generated.breakdown.steps.len(),
        warnings = generated.warnings.len(),
        "Breakdown ready"
    );
    Ok(Json(generated.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_request_defaults() {
        let req: PlanRequest = serde_json::from_str(r#"{"userInput":"App","projectTimeline":"1 week"}"#).unwrap();
        assert_eq!(req.context(), ProjectContext::new("App", "1 week", ""));
        assert!(req.answers().is_empty());
        assert_eq!(req.feedback(), "");

        let req: PlanRequest = serde_json::from_str(r#"{"answers":null,"feedback":null}"#).unwrap();
        assert!(req.answers().is_empty());
    }

    #[test]
    fn test_plan_request_non_string_fields() {
        let req: PlanRequest =
            serde_json::from_str(r#"{"userInput":"App","projectTimeline":null,"projectBudget":5000,"feedback":7}"#)
                .unwrap();
        assert_eq!(req.context(), ProjectContext::new("App", "", "5000"));
        assert_eq!(req.feedback(), "7");
    }

    #[test]
    fn test_plan_request_answers() {
        let req: PlanRequest =
            serde_json::from_str(r#"{"answers":[{"question":"Who?","answer":"Parents"}],"feedback":"Shorter"}"#)
                .unwrap();
        assert_eq!(req.answers(), &[AnsweredQuestion::new("Who?", "Parents")]);
        assert_eq!(req.feedback(), "Shorter");
    }

    #[test]
    fn test_next_question_response_shapes() {
        let ask = serde_json::to_value(NextQuestionResponse::Question {
            question: "Who?".to_string(),
        })
        .unwrap();
        assert_eq!(ask, json!({ "question": "Who?" }));

        let done = serde_json::to_value(NextQuestionResponse::Done { done: true }).unwrap();
        assert_eq!(done, json!({ "done": true }));
    }
}
