// src/handlers/student.rs

use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
    response::IntoResponse,
};
use chrono::Utc;
use validator::Validate;

use crate::{
    engine::QuizEngine,
    error::AppError,
    models::attempt::{StartQuizRequest, SubmitQuizRequest},
    store::sessions::SESSION_HEADER,
};

/// Session token sent by the client, if any.
fn session_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// A request without a token cannot have a live attempt.
fn require_session(headers: &HeaderMap) -> Result<&str, AppError> {
    session_token(headers).ok_or_else(|| {
        tracing::debug!("Student request without {} header", SESSION_HEADER);
        AppError::SessionExpired
    })
}

/// PIN entry. A primary PIN starts a graded attempt and returns the session
/// token to send on the following requests.
pub async fn start_quiz(
    State(engine): State<QuizEngine>,
    headers: HeaderMap,
    Json(payload): Json<StartQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let response = engine
        .start(
            &payload.pin,
            &payload.name,
            session_token(&headers),
            Utc::now(),
        )
        .await?;

    Ok(Json(response))
}

pub async fn get_instructions(
    State(engine): State<QuizEngine>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let token = require_session(&headers)?;
    Ok(Json(engine.instructions(token, Utc::now()).await?))
}

pub async fn get_questions(
    State(engine): State<QuizEngine>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let token = require_session(&headers)?;
    Ok(Json(engine.presented_questions(token, Utc::now()).await?))
}

pub async fn submit_quiz(
    State(engine): State<QuizEngine>,
    headers: HeaderMap,
    Json(payload): Json<SubmitQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let token = require_session(&headers)?;
    Ok(Json(engine.submit(token, &payload.answers, Utc::now()).await?))
}

/// The one-time review of the last submission.
pub async fn get_review(
    State(engine): State<QuizEngine>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let token = session_token(&headers).ok_or(AppError::ReviewUnavailable)?;
    Ok(Json(engine.review(token).await?))
}

pub async fn get_leaderboard(
    State(engine): State<QuizEngine>,
    Path(quiz_id): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(
        engine
            .leaderboard(&quiz_id, session_token(&headers))
            .await?,
    ))
}
