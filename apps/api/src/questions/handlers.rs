//! Axum route handlers for the Questions API.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;
use crate::models::question::{GenerateQuestionsRequest, QuestionSet, QuestionStats};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// POST /api/questions/generate
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateQuestionsRequest>,
) -> Result<Json<QuestionSet>, AppError> {
    let set = state
        .questions
        .generate_and_store(&request.job_title, request.num_questions)
        .await?;
    Ok(Json(set))
}

/// GET /api/questions
pub async fn handle_list(State(state): State<AppState>) -> Result<Json<Vec<QuestionSet>>, AppError> {
    Ok(Json(state.questions.list_grouped().await?))
}

/// POST /api/questions
pub async fn handle_save(
    State(state): State<AppState>,
    Json(set): Json<QuestionSet>,
) -> Result<Json<QuestionSet>, AppError> {
    Ok(Json(state.questions.save_manual(set).await?))
}

/// DELETE /api/questions/:job_title
pub async fn handle_delete_by_job_title(
    State(state): State<AppState>,
    Path(job_title): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let deleted = state.questions.delete_by_job_title(&job_title).await?;
    Ok(Json(MessageResponse {
        message: format!("Deleted {deleted} question(s) for job title '{job_title}'"),
    }))
}

/// DELETE /api/question/:id
pub async fn handle_delete_by_id(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    state.questions.delete_by_id(id).await?;
    Ok(Json(MessageResponse {
        message: format!("Question with ID {id} deleted successfully"),
    }))
}

/// GET /api/stats
pub async fn handle_stats(State(state): State<AppState>) -> Result<Json<QuestionStats>, AppError> {
    Ok(Json(state.questions.stats().await?))
}
