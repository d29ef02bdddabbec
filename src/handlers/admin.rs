// src/handlers/admin.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    models::quiz::{
        AppendQuestionsRequest, CreateQuizRequest, DisplayConfig, ImportQuizRequest,
        PracticeModeConfig, Quiz, QuizSummary, UpdateQuizRequest,
    },
    store::{LeaderboardRepository, QuizRepository},
    utils::{html::clean_instructions, jwt::Claims, pin::generate_pin},
};

/// Attempts at drawing an unused PIN before giving up.
const PIN_ALLOCATION_ATTEMPTS: usize = 50;

/// Draws a random PIN used by no quiz other than `quiz_id` and different from `taken`.
async fn allocate_pin(
    quizzes: &dyn QuizRepository,
    quiz_id: &str,
    taken: Option<&str>,
) -> Result<String, AppError> {
    for _ in 0..PIN_ALLOCATION_ATTEMPTS {
        let candidate = generate_pin();
        if Some(candidate.as_str()) == taken {
            continue;
        }
        if !quizzes.pin_in_use(&candidate, Some(quiz_id)).await? {
            return Ok(candidate);
        }
    }

    Err(AppError::InternalServerError(
        "Could not allocate a unique PIN".to_string(),
    ))
}

/// Fresh primary and practice PINs for `quiz_id`.
async fn allocate_pins(
    quizzes: &dyn QuizRepository,
    quiz_id: &str,
) -> Result<(String, String), AppError> {
    let pin = allocate_pin(quizzes, quiz_id, None).await?;
    let practice_pin = allocate_pin(quizzes, quiz_id, Some(&pin)).await?;
    Ok((pin, practice_pin))
}

async fn find_quiz(quizzes: &dyn QuizRepository, id: &str) -> Result<Quiz, AppError> {
    quizzes
        .load_quiz(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Quiz '{}' not found", id)))
}

/// Lists all quizzes.
pub async fn list_quizzes(
    State(quizzes): State<Arc<dyn QuizRepository>>,
) -> Result<impl IntoResponse, AppError> {
    let summaries: Vec<QuizSummary> = quizzes
        .list_quizzes()
        .await?
        .iter()
        .map(QuizSummary::from)
        .collect();

    Ok(Json(summaries))
}

/// Creates an empty quiz with default display and practice settings.
pub async fn create_quiz(
    State(quizzes): State<Arc<dyn QuizRepository>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let id = Uuid::new_v4().to_string();
    let (pin, practice_pin) = allocate_pins(quizzes.as_ref(), &id).await?;

    let quiz = Quiz {
        id,
        pin,
        practice_pin,
        name: payload.name.trim().to_string(),
        timer_seconds: payload.timer_seconds,
        instructions: clean_instructions(&payload.instructions),
        is_reviewable: payload.is_reviewable,
        display_config: DisplayConfig::default(),
        practice_mode_config: PracticeModeConfig::default(),
        questions: Vec::new(),
    };
    quizzes.save_quiz(&quiz).await?;

    tracing::info!("Quiz {} created by '{}'", quiz.id, claims.username);

    Ok((StatusCode::CREATED, Json(quiz)))
}

/// Creates a quiz from an uploaded question bank `{name, timer?, questions}`.
pub async fn import_quiz(
    State(quizzes): State<Arc<dyn QuizRepository>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ImportQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let id = Uuid::new_v4().to_string();
    let (pin, practice_pin) = allocate_pins(quizzes.as_ref(), &id).await?;

    let quiz = Quiz {
        id,
        pin,
        practice_pin,
        name: payload.name.trim().to_string(),
        timer_seconds: payload.timer_seconds,
        instructions: String::new(),
        is_reviewable: false,
        display_config: DisplayConfig::default(),
        practice_mode_config: PracticeModeConfig::default(),
        questions: payload.questions,
    };
    quiz.validate_content().map_err(AppError::BadRequest)?;
    quizzes.save_quiz(&quiz).await?;

    tracing::info!(
        "Quiz {} imported by '{}' with {} questions",
        quiz.id,
        claims.username,
        quiz.questions.len()
    );

    Ok((StatusCode::CREATED, Json(quiz)))
}

/// Full quiz document, expected answers included.
pub async fn get_quiz(
    State(quizzes): State<Arc<dyn QuizRepository>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(find_quiz(quizzes.as_ref(), &id).await?))
}

/// Replaces the editable parts of a quiz. PINs are kept.
pub async fn update_quiz(
    State(quizzes): State<Arc<dyn QuizRepository>>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let mut quiz = find_quiz(quizzes.as_ref(), &id).await?;
    quiz.name = payload.name.trim().to_string();
    quiz.timer_seconds = payload.timer_seconds;
    quiz.instructions = clean_instructions(&payload.instructions);
    quiz.is_reviewable = payload.is_reviewable;
    quiz.display_config = payload.display_config;
    quiz.practice_mode_config = payload.practice_mode_config;
    quiz.questions = payload.questions;

    quiz.validate_content().map_err(AppError::BadRequest)?;
    quizzes.save_quiz(&quiz).await?;

    tracing::info!("Quiz {} updated", quiz.id);

    Ok(Json(quiz))
}

pub async fn delete_quiz(
    State(quizzes): State<Arc<dyn QuizRepository>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !quizzes.delete_quiz(&id).await? {
        return Err(AppError::NotFound(format!("Quiz '{}' not found", id)));
    }

    tracing::info!("Quiz {} deleted", id);

    Ok(StatusCode::NO_CONTENT)
}

/// Appends questions to the end of the bank.
pub async fn append_questions(
    State(quizzes): State<Arc<dyn QuizRepository>>,
    Path(id): Path<String>,
    Json(payload): Json<AppendQuestionsRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.questions.is_empty() {
        return Err(AppError::BadRequest("No questions supplied".to_string()));
    }

    let mut quiz = find_quiz(quizzes.as_ref(), &id).await?;
    let added = payload.questions.len();
    quiz.questions.extend(payload.questions);

    quiz.validate_content().map_err(AppError::BadRequest)?;
    quizzes.save_quiz(&quiz).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "added": added,
            "question_count": quiz.questions.len()
        })),
    ))
}

/// Issues new primary and practice PINs. The old ones stop working at once.
pub async fn regenerate_pins(
    State(quizzes): State<Arc<dyn QuizRepository>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let mut quiz = find_quiz(quizzes.as_ref(), &id).await?;
    let (pin, practice_pin) = allocate_pins(quizzes.as_ref(), &id).await?;
    quiz.pin = pin;
    quiz.practice_pin = practice_pin;
    quizzes.save_quiz(&quiz).await?;

    tracing::info!("PINs regenerated for quiz {}", quiz.id);

    Ok(Json(json!({
        "pin": quiz.pin,
        "practice_pin": quiz.practice_pin
    })))
}

pub async fn quiz_leaderboard(
    State(quizzes): State<Arc<dyn QuizRepository>>,
    State(leaderboard): State<Arc<dyn LeaderboardRepository>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = find_quiz(quizzes.as_ref(), &id).await?;
    let rows = leaderboard.list_rows(&quiz.id).await?;

    Ok(Json(json!({
        "quiz_id": quiz.id,
        "quiz_name": quiz.name,
        "rows": rows
    })))
}
