//! Axum route handlers for the Assessment API.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::assessment::controller::SessionController;
use crate::assessment::models::{FinalSummary, Language, RunResult, Submission};
use crate::assessment::session::{SelectedQuestion, SessionSnapshot};
use crate::assessment::templates::code_template;
use crate::credentials::token_from_headers;
use crate::errors::AppError;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    #[serde(default)]
    pub language: Language,
}

#[derive(Debug, Deserialize)]
pub struct CodeRequest {
    #[serde(default)]
    pub language: Language,
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct LanguageTemplate {
    pub language: Language,
    pub template: &'static str,
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

/// Looks up a session and checks the caller presents the token it was
/// started with.
async fn authorized_session(
    state: &AppState,
    session_id: &str,
    headers: &HeaderMap,
) -> Result<Arc<SessionController>, AppError> {
    let credentials = token_from_headers(headers).ok_or(AppError::Unauthorized)?;
    let controller = state
        .sessions
        .get(session_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {session_id} not found")))?;
    controller.authorize(&credentials)?;
    Ok(controller)
}

fn require_code(request: &CodeRequest) -> Result<(), AppError> {
    if request.code.trim().is_empty() {
        return Err(AppError::Validation("code cannot be empty".to_string()));
    }
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/languages
pub async fn handle_list_languages() -> Json<Vec<LanguageTemplate>> {
    Json(
        Language::ALL
            .iter()
            .map(|&language| LanguageTemplate {
                language,
                template: code_template(language),
            })
            .collect(),
    )
}

/// POST /api/v1/sessions/:session_id/start
///
/// Loads topics, generates questions and starts the countdown. Calling it for
/// a session that is already running returns that session unchanged, provided
/// the caller presents the token it was started with.
pub async fn handle_start_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<SessionSnapshot>, AppError> {
    if session_id.trim().is_empty() {
        return Err(AppError::Validation("Session ID is required".to_string()));
    }

    let credentials = token_from_headers(&headers).ok_or(AppError::Unauthorized)?;
    if let Some(existing) = state.sessions.get(&session_id).await {
        existing.authorize(&credentials)?;
        return Ok(Json(existing.snapshot().await));
    }

    let controller = SessionController::start(
        &session_id,
        state.config.session_settings(),
        &state.deps,
        Arc::new(credentials.clone()),
    )
    .await?;

    let controller = state
        .sessions
        .insert_or_existing(&session_id, controller)
        .await;
    controller.authorize(&credentials)?;
    Ok(Json(controller.snapshot().await))
}

/// GET /api/v1/sessions/:session_id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<SessionSnapshot>, AppError> {
    let controller = authorized_session(&state, &session_id, &headers).await?;
    Ok(Json(controller.snapshot().await))
}

/// POST /api/v1/sessions/:session_id/questions/:index/select
pub async fn handle_select_question(
    State(state): State<AppState>,
    Path((session_id, index)): Path<(String, usize)>,
    headers: HeaderMap,
    Json(request): Json<SelectRequest>,
) -> Result<Json<SelectedQuestion>, AppError> {
    let controller = authorized_session(&state, &session_id, &headers).await?;
    Ok(Json(controller.select_question(index, request.language).await?))
}

/// POST /api/v1/sessions/:session_id/questions/:index/run
///
/// Budget-limited run against the sample input. An exhausted budget is a
/// normal response with `is_output: false`, not an HTTP error.
pub async fn handle_run(
    State(state): State<AppState>,
    Path((session_id, index)): Path<(String, usize)>,
    headers: HeaderMap,
    Json(request): Json<CodeRequest>,
) -> Result<Json<RunResult>, AppError> {
    let controller = authorized_session(&state, &session_id, &headers).await?;
    require_code(&request)?;
    let result = controller
        .run_test(index, request.language, &request.code)
        .await?;
    Ok(Json(result))
}

/// POST /api/v1/sessions/:session_id/questions/:index/submit
pub async fn handle_submit(
    State(state): State<AppState>,
    Path((session_id, index)): Path<(String, usize)>,
    headers: HeaderMap,
    Json(request): Json<CodeRequest>,
) -> Result<Json<Submission>, AppError> {
    let controller = authorized_session(&state, &session_id, &headers).await?;
    require_code(&request)?;
    let submission = controller
        .submit(index, request.language, request.code)
        .await?;
    Ok(Json(submission))
}

/// POST /api/v1/sessions/:session_id/finalize
///
/// Closes the session. Safe to call repeatedly; always returns the same summary.
pub async fn handle_finalize(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<FinalSummary>, AppError> {
    let controller = authorized_session(&state, &session_id, &headers).await?;
    Ok(Json(controller.finalize().await))
}
