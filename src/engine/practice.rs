// src/engine/practice.rs

//! Practice mode: ad-hoc question sets reached through a quiz's practice PIN.
//! Nothing here stores an attempt or touches the leaderboard.

use std::collections::{BTreeMap, HashMap};

use serde_json::Value;

use crate::{
    engine::{grader, selector, session::QuizEngine},
    error::AppError,
    models::{
        practice::{PracticeCheckResponse, PracticeQuestion, PracticeQuestionsResponse},
        question::QuestionKind,
        quiz::Quiz,
    },
    store::PinKind,
    utils::pin,
};

/// Counts to draw for a practice set. Student choices apply only when the
/// quiz allows them; they are rejected whole when they exceed the quiz's cap
/// or ask for more of a type than exists.
pub fn resolve_practice_counts(
    quiz: &Quiz,
    requested: Option<&BTreeMap<QuestionKind, u32>>,
) -> Result<BTreeMap<QuestionKind, u32>, AppError> {
    let config = &quiz.practice_mode_config;

    let Some(requested) = requested.filter(|_| config.allow_student_selection) else {
        return Ok(quiz.display_config.parameters.clone());
    };

    let total: u64 = requested.values().map(|c| u64::from(*c)).sum();
    if total > u64::from(config.max_questions_limit) {
        return Err(AppError::PracticeLimitExceeded(format!(
            "You requested {} questions, but practice is limited to {}.",
            total, config.max_questions_limit
        )));
    }

    let available = quiz.available_counts();
    for (kind, count) in requested {
        let have = available.get(kind).copied().unwrap_or(0);
        if *count > have {
            return Err(AppError::PracticeTypeUnavailable(format!(
                "You requested {} '{}' questions, but only {} are available.",
                count,
                kind.as_str(),
                have
            )));
        }
    }

    Ok(requested.clone())
}

impl QuizEngine {
    /// Quiz behind a practice PIN, if practice is enabled for it.
    async fn practice_quiz(&self, entered: &str) -> Result<Quiz, AppError> {
        let entered = entered.trim();
        if !pin::is_well_formed(entered) {
            return Err(AppError::InvalidPin);
        }

        match self.quizzes.find_by_pin(entered).await? {
            Some(found)
                if found.kind == PinKind::Practice && found.quiz.practice_mode_config.enabled =>
            {
                Ok(found.quiz)
            }
            _ => Err(AppError::InvalidPin),
        }
    }

    pub async fn practice_questions(
        &self,
        pin: &str,
        requested: Option<&BTreeMap<QuestionKind, u32>>,
    ) -> Result<PracticeQuestionsResponse, AppError> {
        let quiz = self.practice_quiz(pin).await?;
        let counts = resolve_practice_counts(&quiz, requested)?;

        let indices = selector::select_by_count(&quiz.questions, &counts, &mut rand::rng());
        if indices.is_empty() {
            return Err(AppError::NoEligibleQuestions);
        }

        tracing::debug!("Practice set of {} questions for quiz {}", indices.len(), quiz.id);

        Ok(PracticeQuestionsResponse {
            questions: indices
                .into_iter()
                .map(|index| PracticeQuestion {
                    index,
                    question: quiz.questions[index].redacted(),
                })
                .collect(),
            quiz_id: quiz.id,
            quiz_name: quiz.name,
        })
    }

    /// Grades a practice set untimed. Unknown indices are ignored.
    pub async fn practice_check(
        &self,
        pin: &str,
        question_indices: &[usize],
        raw_answers: &HashMap<String, Value>,
    ) -> Result<PracticeCheckResponse, AppError> {
        let quiz = self.practice_quiz(pin).await?;

        let mut questions = Vec::new();
        let mut answers = HashMap::new();
        let submitted = grader::index_answers(raw_answers);
        for (position, index) in question_indices.iter().enumerate() {
            if let Some(question) = quiz.questions.get(*index) {
                if let Some(answer) = submitted.get(&position) {
                    answers.insert(questions.len(), answer.clone());
                }
                questions.push(question.clone());
            }
        }

        let grade = grader::grade(&questions, &answers, 0, 0);

        Ok(PracticeCheckResponse {
            score: grade.score,
            max_score: grade.max_score,
            review: grade.review,
        })
    }
}
