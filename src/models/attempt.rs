// src/models/attempt.rs

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::question::{Question, QuestionKind};

/// One student's in-progress quiz instance. Lives only in the session store
/// and is consumed by the submission that grades it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    pub quiz_id: String,
    pub student_name: String,
    pub start_time: DateTime<Utc>,
    /// Indices into `Quiz::questions`, in presentation order.
    pub question_order: Vec<usize>,
}

/// DTO for entering a PIN.
#[derive(Debug, Deserialize, Validate)]
pub struct StartQuizRequest {
    pub pin: String,
    #[validate(length(min = 1, max = 64, message = "Please enter your name."))]
    pub name: String,
}

/// Reply to a successful PIN entry.
#[derive(Debug, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum StartQuizResponse {
    Graded {
        session_token: String,
        quiz_id: String,
        quiz_name: String,
        total_questions: usize,
        timer_seconds: i64,
    },
    Practice {
        quiz_id: String,
        quiz_name: String,
        allow_student_selection: bool,
        max_questions_limit: u32,
        default_counts: BTreeMap<QuestionKind, u32>,
        available_counts: BTreeMap<QuestionKind, u32>,
    },
}

/// What the instructions page shows before the student begins.
#[derive(Debug, Serialize)]
pub struct InstructionsResponse {
    pub quiz_id: String,
    pub quiz_name: String,
    pub student_name: String,
    pub instructions: String,
    pub total_questions: usize,
    pub timer_seconds: i64,
    /// `None` for untimed quizzes.
    pub remaining_seconds: Option<i64>,
}

/// The question sheet for a live attempt, answers stripped.
#[derive(Debug, Serialize)]
pub struct PresentedQuestions {
    pub quiz_id: String,
    pub quiz_name: String,
    pub timer_seconds: i64,
    pub remaining_seconds: Option<i64>,
    pub questions: Vec<PresentedQuestion>,
}

/// A redacted question with the key its answer must be submitted under.
#[derive(Debug, Serialize)]
pub struct PresentedQuestion {
    pub position: usize,
    #[serde(flatten)]
    pub question: Question,
}

/// DTO for submitting all answers at once.
///
/// Keys are presentation indices (`"0"`, `"1"`, ...). Values are kept as raw
/// JSON so a malformed answer only costs its own question.
#[derive(Debug, Default, Deserialize)]
pub struct SubmitQuizRequest {
    #[serde(default)]
    pub answers: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct SubmitQuizResponse {
    pub quiz_id: String,
    pub score: i64,
    pub max_score: i64,
    pub time_expired: bool,
    pub review_available: bool,
    pub message: String,
}
