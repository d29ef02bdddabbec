// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
///
/// The quiz-flow variants are all user-recoverable: the response carries a
/// `redirect` hint pointing the client back to a safe page.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    AuthError(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict (e.g., duplicate PIN)
    Conflict(String),

    /// No quiz answers to the submitted PIN.
    InvalidPin,

    /// The display policy selected nothing for this attempt.
    NoEligibleQuestions,

    /// No live attempt for this session (never started, expired or already submitted).
    SessionExpired,

    /// The one-time review was already consumed or never produced.
    ReviewUnavailable,

    PracticeLimitExceeded(String),

    PracticeTypeUnavailable(String),

    QuizNotFound,
}

impl AppError {
    fn kind(&self) -> &'static str {
        match self {
            AppError::InternalServerError(_) => "internal",
            AppError::BadRequest(_) => "bad_request",
            AppError::AuthError(_) => "unauthorized",
            AppError::Forbidden(_) => "forbidden",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::InvalidPin => "invalid_pin",
            AppError::NoEligibleQuestions => "no_eligible_questions",
            AppError::SessionExpired => "session_expired",
            AppError::ReviewUnavailable => "review_unavailable",
            AppError::PracticeLimitExceeded(_) => "practice_limit_exceeded",
            AppError::PracticeTypeUnavailable(_) => "practice_type_unavailable",
            AppError::QuizNotFound => "quiz_not_found",
        }
    }

    fn redirect(&self) -> Option<&'static str> {
        match self {
            AppError::InvalidPin
            | AppError::NoEligibleQuestions
            | AppError::SessionExpired
            | AppError::ReviewUnavailable
            | AppError::QuizNotFound => Some("/"),
            AppError::PracticeLimitExceeded(_) | AppError::PracticeTypeUnavailable(_) => {
                Some("/practice")
            }
            _ => None,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let redirect = self.redirect();

        let (status, error_message) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::AuthError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::InvalidPin => (StatusCode::NOT_FOUND, "Invalid PIN entered.".to_string()),
            AppError::NoEligibleQuestions => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "This quiz has no questions to display based on its current rules.".to_string(),
            ),
            AppError::SessionExpired => (
                StatusCode::GONE,
                "Please enter a valid PIN and your name to start a quiz.".to_string(),
            ),
            AppError::ReviewUnavailable => (
                StatusCode::GONE,
                "Review data is no longer available. Please start a new quiz.".to_string(),
            ),
            AppError::PracticeLimitExceeded(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::PracticeTypeUnavailable(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::QuizNotFound => (StatusCode::NOT_FOUND, "Quiz not found.".to_string()),
        };

        let body = Json(json!({
            "error": error_message,
            "kind": kind,
            "redirect": redirect,
        }));

        (status, body).into_response()
    }
}

/// Converts `sqlx::Error` into `AppError::InternalServerError`.
/// Allows using `?` operator on database queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(err.to_string())
    }
}
