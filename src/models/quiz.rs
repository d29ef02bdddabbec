// src/models/quiz.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::question::{MAX_QUESTION_SCORE, Part, Question, QuestionKind};

/// How the selector picks questions for an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    QuestionCount,
    TotalScore,
}

/// Declarative display policy of a quiz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub mode: DisplayMode,
    /// Requested number of questions per type (`question_count` mode).
    #[serde(default)]
    pub parameters: BTreeMap<QuestionKind, u32>,
    /// Score to reach (`total_score` mode).
    #[serde(default)]
    pub target_score: i64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            mode: DisplayMode::QuestionCount,
            parameters: QuestionKind::ALL.iter().map(|kind| (*kind, 0)).collect(),
            target_score: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PracticeModeConfig {
    pub enabled: bool,
    pub allow_student_selection: bool,
    /// Cap on the sum of per-type counts a student may request.
    pub max_questions_limit: u32,
}

impl Default for PracticeModeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            allow_student_selection: false,
            max_questions_limit: 10,
        }
    }
}

/// A quiz document as stored, after schema upgrade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    pub id: String,
    pub pin: String,
    pub practice_pin: String,
    pub name: String,
    /// Zero means untimed.
    pub timer_seconds: i64,
    pub instructions: String,
    pub is_reviewable: bool,
    pub display_config: DisplayConfig,
    pub practice_mode_config: PracticeModeConfig,
    pub questions: Vec<Question>,
}

impl Quiz {
    /// Number of questions of each type.
    pub fn available_counts(&self) -> BTreeMap<QuestionKind, u32> {
        let mut counts: BTreeMap<QuestionKind, u32> =
            QuestionKind::ALL.iter().map(|kind| (*kind, 0)).collect();
        for question in &self.questions {
            *counts.entry(question.kind()).or_insert(0) += 1;
        }
        counts
    }

    /// Sum of all positive question scores.
    pub fn total_possible_score(&self) -> i64 {
        self.questions
            .iter()
            .map(Question::score)
            .filter(|score| *score > 0)
            .fold(0, i64::saturating_add)
    }

    /// Authoring-time checks: every question is well formed and the display
    /// policy can be satisfied by the question bank.
    pub fn validate_content(&self) -> Result<(), String> {
        for (i, question) in self.questions.iter().enumerate() {
            validate_question(question, &(i + 1).to_string())?;
        }
        self.validate_display_config()
    }

    fn validate_display_config(&self) -> Result<(), String> {
        let config = &self.display_config;
        match config.mode {
            DisplayMode::QuestionCount => {
                let available = self.available_counts();
                for (kind, count) in &config.parameters {
                    let have = available.get(kind).copied().unwrap_or(0);
                    if *count > have {
                        return Err(format!(
                            "You requested {} '{}' questions, but only {} are available.",
                            count,
                            kind.as_str(),
                            have
                        ));
                    }
                }
            }
            DisplayMode::TotalScore => {
                let total = self.total_possible_score();
                if config.target_score > total {
                    return Err(format!(
                        "Target score of {} is higher than the total possible score of all questions ({}).",
                        config.target_score, total
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Validates one question; `label` is its human numbering (`3`, `3.2`).
pub fn validate_question(question: &Question, label: &str) -> Result<(), String> {
    if question.text().trim().is_empty() {
        return Err(format!("Question #{} is missing its main text.", label));
    }
    if question.score() < 0 {
        return Err(format!("Question #{} has a negative score.", label));
    }
    if !matches!(question, Question::Multipart(_)) {
        check_score_cap(question.score(), label)?;
    }

    match question {
        Question::MultipleChoice(q) => {
            validate_options(label, "multiple-choice", &q.options, q.answer.iter())
        }
        Question::MultipleSelect(q) => validate_options(
            label,
            "multiple-select",
            &q.options,
            q.answer.iter().flatten(),
        ),
        Question::ShortAnswer(q) => require_answer(label, "short-answer", q.answer.as_deref()),
        Question::Multipart(q) => {
            if q.parts.is_empty() {
                return Err(format!(
                    "Question #{} ('multipart') has no sub-questions (parts) defined.",
                    label
                ));
            }
            for (i, part) in q.parts.iter().enumerate() {
                validate_part(part, &format!("{}.{}", label, i + 1))?;
            }
            Ok(())
        }
    }
}

fn validate_part(part: &Part, label: &str) -> Result<(), String> {
    if part.text().trim().is_empty() {
        return Err(format!("Question #{} is missing its main text.", label));
    }
    if part.score() < 0 {
        return Err(format!("Question #{} has a negative score.", label));
    }
    check_score_cap(part.score(), label)?;

    match part {
        Part::MultipleChoice(q) => {
            validate_options(label, "multiple-choice", &q.options, q.answer.iter())
        }
        Part::MultipleSelect(q) => validate_options(
            label,
            "multiple-select",
            &q.options,
            q.answer.iter().flatten(),
        ),
        Part::ShortAnswer(q) => require_answer(label, "short-answer", q.answer.as_deref()),
    }
}

fn check_score_cap(score: i64, label: &str) -> Result<(), String> {
    if score > MAX_QUESTION_SCORE {
        return Err(format!(
            "Question #{} is worth {} points; the maximum is {}.",
            label, score, MAX_QUESTION_SCORE
        ));
    }
    Ok(())
}

fn validate_options<'a>(
    label: &str,
    kind: &str,
    options: &[String],
    answers: impl Iterator<Item = &'a String>,
) -> Result<(), String> {
    if options.iter().all(|opt| opt.trim().is_empty()) {
        return Err(format!("Question #{} ('{}') has no options defined.", label, kind));
    }
    for answer in answers {
        if !options.contains(answer) {
            return Err(format!(
                "Question #{}: The answer '{}' is not listed in the provided options.",
                label, answer
            ));
        }
    }
    Ok(())
}

fn require_answer(label: &str, kind: &str, answer: Option<&str>) -> Result<(), String> {
    match answer {
        Some(a) if !a.trim().is_empty() => Ok(()),
        _ => Err(format!("Question #{} ('{}') is missing an answer.", label, kind)),
    }
}

/// Summary row for the admin dashboard.
#[derive(Debug, Serialize)]
pub struct QuizSummary {
    pub id: String,
    pub name: String,
    pub pin: String,
    pub practice_pin: String,
    pub timer_seconds: i64,
    pub is_reviewable: bool,
    pub practice_enabled: bool,
    pub question_count: usize,
}

impl From<&Quiz> for QuizSummary {
    fn from(quiz: &Quiz) -> Self {
        Self {
            id: quiz.id.clone(),
            name: quiz.name.clone(),
            pin: quiz.pin.clone(),
            practice_pin: quiz.practice_pin.clone(),
            timer_seconds: quiz.timer_seconds,
            is_reviewable: quiz.is_reviewable,
            practice_enabled: quiz.practice_mode_config.enabled,
            question_count: quiz.questions.len(),
        }
    }
}

/// DTO for creating an empty quiz.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 200, message = "Quiz name is required."))]
    pub name: String,
    #[validate(range(min = 0, max = 86400))]
    #[serde(default = "default_timer")]
    pub timer_seconds: i64,
    #[serde(default)]
    pub is_reviewable: bool,
    #[validate(length(max = 10000))]
    #[serde(default)]
    pub instructions: String,
}

fn default_timer() -> i64 {
    300
}

/// DTO for importing a quiz from an uploaded JSON file.
#[derive(Debug, Deserialize, Validate)]
pub struct ImportQuizRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    /// Legacy exports call this field `timer`.
    #[validate(range(min = 0, max = 86400))]
    #[serde(default = "default_import_timer", alias = "timer")]
    pub timer_seconds: i64,
    pub questions: Vec<Question>,
}

fn default_import_timer() -> i64 {
    600
}

/// DTO for the full quiz editor save. Id and PINs are not editable here.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateQuizRequest {
    #[validate(length(min = 1, max = 200, message = "Quiz name is required."))]
    pub name: String,
    #[validate(range(min = 0, max = 86400))]
    #[serde(alias = "timer")]
    pub timer_seconds: i64,
    #[validate(length(max = 10000))]
    #[serde(default)]
    pub instructions: String,
    #[serde(default)]
    pub is_reviewable: bool,
    pub display_config: DisplayConfig,
    #[serde(default)]
    pub practice_mode_config: PracticeModeConfig,
    pub questions: Vec<Question>,
}

/// DTO for appending questions to an existing quiz.
#[derive(Debug, Deserialize)]
pub struct AppendQuestionsRequest {
    pub questions: Vec<Question>,
}
