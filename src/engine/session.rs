// src/engine/session.rs

//! The student quiz flow: PIN entry, presentation, submission, leaderboard
//! and the one-time review.
//!
//! Idle -> Started (PIN accepted, attempt stored) -> Presenting (instructions
//! and questions read) -> Submitted (attempt consumed, row appended, review
//! parked) -> Reviewed (review consumed) -> Idle.

use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::{
    engine::{grader, selector},
    error::AppError,
    models::{
        attempt::{
            Attempt, InstructionsResponse, PresentedQuestion, PresentedQuestions,
            StartQuizResponse, SubmitQuizResponse,
        },
        leaderboard::LeaderboardResponse,
        question::Question,
        quiz::Quiz,
        review::ReviewHandoff,
    },
    store::{
        LeaderboardRepository, PinKind, QuizRepository,
        handoff::HandoffStore,
        sessions::{PendingReview, SessionStore},
    },
    utils::pin,
};

/// Owns the collaborators of the quiz flow. Cheap to clone.
#[derive(Clone)]
pub struct QuizEngine {
    pub(crate) quizzes: Arc<dyn QuizRepository>,
    pub(crate) leaderboard: Arc<dyn LeaderboardRepository>,
    pub(crate) sessions: SessionStore,
    pub(crate) reviews: HandoffStore<ReviewHandoff>,
}

impl QuizEngine {
    pub fn new(
        quizzes: Arc<dyn QuizRepository>,
        leaderboard: Arc<dyn LeaderboardRepository>,
        sessions: SessionStore,
        reviews: HandoffStore<ReviewHandoff>,
    ) -> Self {
        Self {
            quizzes,
            leaderboard,
            sessions,
            reviews,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn reviews(&self) -> &HandoffStore<ReviewHandoff> {
        &self.reviews
    }

    /// Drops expired sessions and unread reviews.
    pub fn sweep(&self) -> (usize, usize) {
        (self.sessions.sweep(), self.reviews.sweep())
    }

    /// Handles a PIN entry. A primary PIN starts a graded attempt; a practice
    /// PIN of a quiz with practice enabled describes the practice options and
    /// stores nothing.
    pub async fn start(
        &self,
        pin: &str,
        name: &str,
        token: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<StartQuizResponse, AppError> {
        let pin = pin.trim();
        let name = name.trim();

        if name.is_empty() {
            return Err(AppError::BadRequest("Please enter your name.".to_string()));
        }
        if !pin::is_well_formed(pin) {
            return Err(AppError::InvalidPin);
        }

        let Some(found) = self.quizzes.find_by_pin(pin).await? else {
            tracing::debug!("No quiz for entered PIN");
            return Err(AppError::InvalidPin);
        };
        let quiz = found.quiz;

        if found.kind == PinKind::Practice {
            if !quiz.practice_mode_config.enabled {
                return Err(AppError::InvalidPin);
            }
            return Ok(StartQuizResponse::Practice {
                available_counts: quiz.available_counts(),
                default_counts: quiz.display_config.parameters.clone(),
                allow_student_selection: quiz.practice_mode_config.allow_student_selection,
                max_questions_limit: quiz.practice_mode_config.max_questions_limit,
                quiz_id: quiz.id,
                quiz_name: quiz.name,
            });
        }

        let question_order =
            selector::select(&quiz.questions, &quiz.display_config, &mut rand::rng());
        if question_order.is_empty() {
            tracing::warn!("Quiz {} selected no questions", quiz.id);
            return Err(AppError::NoEligibleQuestions);
        }

        let total_questions = question_order.len();
        let attempt = Attempt {
            quiz_id: quiz.id.clone(),
            student_name: name.to_string(),
            start_time: now,
            question_order,
        };
        let session_token = self.sessions.begin_attempt(token, attempt);

        tracing::info!(
            "Attempt started on quiz {} by '{}' with {} questions",
            quiz.id,
            name,
            total_questions
        );

        Ok(StartQuizResponse::Graded {
            session_token,
            quiz_id: quiz.id,
            quiz_name: quiz.name,
            total_questions,
            timer_seconds: quiz.timer_seconds,
        })
    }

    /// Live attempt plus its quiz.
    async fn live_attempt(&self, token: &str) -> Result<(Attempt, Quiz), AppError> {
        let attempt = self
            .sessions
            .attempt(token)
            .ok_or(AppError::SessionExpired)?;
        let quiz = self
            .quizzes
            .load_quiz(&attempt.quiz_id)
            .await?
            .ok_or(AppError::QuizNotFound)?;
        Ok((attempt, quiz))
    }

    pub async fn instructions(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<InstructionsResponse, AppError> {
        let (attempt, quiz) = self.live_attempt(token).await?;

        Ok(InstructionsResponse {
            remaining_seconds: remaining_seconds(&quiz, &attempt, now),
            total_questions: attempt.question_order.len(),
            quiz_id: quiz.id,
            quiz_name: quiz.name,
            student_name: attempt.student_name,
            instructions: quiz.instructions,
            timer_seconds: quiz.timer_seconds,
        })
    }

    /// The attempt's questions in presentation order, answers stripped.
    pub async fn presented_questions(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<PresentedQuestions, AppError> {
        let (attempt, quiz) = self.live_attempt(token).await?;
        let questions = presented(&quiz, &attempt)
            .into_iter()
            .map(|(position, question)| PresentedQuestion {
                position,
                question: question.redacted(),
            })
            .collect();

        Ok(PresentedQuestions {
            remaining_seconds: remaining_seconds(&quiz, &attempt, now),
            questions,
            quiz_id: quiz.id,
            quiz_name: quiz.name,
            timer_seconds: quiz.timer_seconds,
        })
    }

    /// Grades and records the attempt. The attempt is consumed first, so a
    /// repeated submission finds no attempt and is rejected. If the score
    /// cannot be stored the attempt is put back for a retry.
    pub async fn submit(
        &self,
        token: &str,
        raw_answers: &HashMap<String, Value>,
        now: DateTime<Utc>,
    ) -> Result<SubmitQuizResponse, AppError> {
        let Some(attempt) = self.sessions.take_attempt(token) else {
            tracing::warn!("Submission without a live attempt");
            return Err(AppError::SessionExpired);
        };

        let quiz = match self.quizzes.load_quiz(&attempt.quiz_id).await {
            Ok(Some(quiz)) => quiz,
            Ok(None) => return Err(AppError::QuizNotFound),
            Err(e) => {
                self.sessions.restore_attempt(token, attempt);
                return Err(e);
            }
        };

        let questions = presented(&quiz, &attempt);
        let elapsed = (now - attempt.start_time).num_seconds();
        let answers = grader::index_answers(raw_answers);
        let grade = grader::grade_positioned(&questions, &answers, quiz.timer_seconds, elapsed);

        if let Err(e) = self
            .leaderboard
            .append_row(&quiz.id, &attempt.student_name, grade.score)
            .await
        {
            tracing::warn!("Score for quiz {} not recorded, attempt kept for retry", quiz.id);
            self.sessions.restore_attempt(token, attempt);
            return Err(e);
        }

        self.sessions.finish_attempt(token, &attempt.student_name);

        let review_available = quiz.is_reviewable && !grade.review.is_empty();
        if review_available {
            let handoff_token = self.reviews.put(ReviewHandoff {
                quiz_id: quiz.id.clone(),
                quiz_name: quiz.name.clone(),
                student_name: attempt.student_name.clone(),
                score: grade.score,
                items: grade.review,
            });
            self.sessions.set_pending_review(
                token,
                PendingReview {
                    quiz_id: quiz.id.clone(),
                    handoff_token,
                },
            );
        }

        tracing::info!(
            "Quiz {} submitted by '{}': {}/{} after {}s{}",
            quiz.id,
            attempt.student_name,
            grade.score,
            grade.max_score,
            elapsed,
            if grade.time_expired { " (late)" } else { "" }
        );

        let message = if grade.time_expired {
            "Time ran out! Your score was recorded as 0.".to_string()
        } else {
            "Quiz submitted successfully".to_string()
        };

        Ok(SubmitQuizResponse {
            quiz_id: quiz.id,
            score: grade.score,
            max_score: grade.max_score,
            time_expired: grade.time_expired,
            review_available,
            message,
        })
    }

    /// Hands out the parked review exactly once.
    pub async fn review(&self, token: &str) -> Result<ReviewHandoff, AppError> {
        let pending = self
            .sessions
            .take_pending_review(token)
            .ok_or(AppError::ReviewUnavailable)?;

        self.reviews
            .take(&pending.handoff_token)
            .ok_or(AppError::ReviewUnavailable)
    }

    pub async fn leaderboard(
        &self,
        quiz_id: &str,
        token: Option<&str>,
    ) -> Result<LeaderboardResponse, AppError> {
        let quiz = self
            .quizzes
            .load_quiz(quiz_id)
            .await?
            .ok_or(AppError::QuizNotFound)?;
        let rows = self.leaderboard.list_rows(quiz_id).await?;

        let review_available = token
            .and_then(|t| self.sessions.peek_pending_review(t))
            .is_some_and(|review| review.quiz_id == quiz.id);
        let student_name = token
            .and_then(|t| self.sessions.session(t))
            .and_then(|s| s.last_result_name);

        Ok(LeaderboardResponse {
            quiz_id: quiz.id,
            quiz_name: quiz.name,
            is_reviewable: quiz.is_reviewable,
            student_name,
            review_available,
            rows,
        })
    }
}

/// The attempt's questions with their presentation positions. A question
/// deleted from the quiz mid-attempt leaves a gap; the positions of the
/// others do not move.
fn presented<'a>(quiz: &'a Quiz, attempt: &Attempt) -> Vec<(usize, &'a Question)> {
    attempt
        .question_order
        .iter()
        .enumerate()
        .filter_map(|(position, i)| {
            let question = quiz.questions.get(*i);
            if question.is_none() {
                tracing::warn!("Quiz {} has no question at index {}", quiz.id, i);
            }
            question.map(|q| (position, q))
        })
        .collect()
}

fn remaining_seconds(quiz: &Quiz, attempt: &Attempt, now: DateTime<Utc>) -> Option<i64> {
    (quiz.timer_seconds > 0).then(|| {
        let elapsed = (now - attempt.start_time).num_seconds();
        (quiz.timer_seconds - elapsed).max(0)
    })
}
