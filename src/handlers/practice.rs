// src/handlers/practice.rs

use axum::{Json, extract::State, response::IntoResponse};

use crate::{
    engine::QuizEngine,
    error::AppError,
    models::practice::{PracticeCheckRequest, PracticeQuestionsRequest},
};

/// Draws a practice set. Nothing is stored for the student.
pub async fn practice_questions(
    State(engine): State<QuizEngine>,
    Json(payload): Json<PracticeQuestionsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = engine
        .practice_questions(&payload.pin, payload.counts.as_ref())
        .await?;

    Ok(Json(response))
}

pub async fn practice_check(
    State(engine): State<QuizEngine>,
    Json(payload): Json<PracticeCheckRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = engine
        .practice_check(&payload.pin, &payload.question_indices, &payload.answers)
        .await?;

    Ok(Json(response))
}
