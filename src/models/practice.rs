// src/models/practice.rs

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::models::{
    question::{Question, QuestionKind},
    review::ReviewRecord,
};

/// DTO for requesting a practice set. `counts` is honoured only when the
/// quiz lets students choose.
#[derive(Debug, Deserialize)]
pub struct PracticeQuestionsRequest {
    pub pin: String,
    #[serde(default)]
    pub counts: Option<BTreeMap<QuestionKind, u32>>,
}

#[derive(Debug, Serialize)]
pub struct PracticeQuestion {
    /// Index into the quiz's question bank, echoed back by `check`.
    pub index: usize,
    pub question: Question,
}

#[derive(Debug, Serialize)]
pub struct PracticeQuestionsResponse {
    pub quiz_id: String,
    pub quiz_name: String,
    pub questions: Vec<PracticeQuestion>,
}

/// DTO for self-checking a practice set. Answer keys are positions in
/// `question_indices`.
#[derive(Debug, Deserialize)]
pub struct PracticeCheckRequest {
    pub pin: String,
    pub question_indices: Vec<usize>,
    #[serde(default)]
    pub answers: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct PracticeCheckResponse {
    pub score: i64,
    pub max_score: i64,
    pub review: ReviewRecord,
}
