// src/models/question.rs

use serde::{Deserialize, Deserializer, Serialize};

/// Points awarded when a question document carries no explicit score.
pub const DEFAULT_QUESTION_SCORE: i64 = 1;

/// Highest score an author may give one question or part.
pub const MAX_QUESTION_SCORE: i64 = 10_000;

fn default_score() -> i64 {
    DEFAULT_QUESTION_SCORE
}

/// The four question shapes. Used as the key of display and practice parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    MultipleChoice,
    MultipleSelect,
    ShortAnswer,
    Multipart,
}

impl QuestionKind {
    pub const ALL: [QuestionKind; 4] = [
        QuestionKind::MultipleChoice,
        QuestionKind::MultipleSelect,
        QuestionKind::ShortAnswer,
        QuestionKind::Multipart,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice => "multiple-choice",
            QuestionKind::MultipleSelect => "multiple-select",
            QuestionKind::ShortAnswer => "short-answer",
            QuestionKind::Multipart => "multipart",
        }
    }
}

/// Single correct option out of a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceQuestion {
    pub text: String,
    #[serde(default = "default_score")]
    pub score: i64,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

/// Any subset of options; graded as an exact set match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectQuestion {
    pub text: String,
    #[serde(default = "default_score")]
    pub score: i64,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Option::is_none"
    )]
    pub answer: Option<Vec<String>>,
}

/// Free text, compared case-insensitively after trimming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextQuestion {
    pub text: String,
    #[serde(default = "default_score")]
    pub score: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

/// A group of leaf questions graded part by part. Carries no score of its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultipartQuestion {
    pub text: String,
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// A stored quiz question, tagged by its `type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Question {
    MultipleChoice(ChoiceQuestion),
    MultipleSelect(SelectQuestion),
    ShortAnswer(TextQuestion),
    Multipart(MultipartQuestion),
}

/// One part of a multipart question. Nesting a multipart inside a part is
/// rejected at deserialization time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Part {
    MultipleChoice(ChoiceQuestion),
    MultipleSelect(SelectQuestion),
    ShortAnswer(TextQuestion),
}

impl Question {
    pub fn kind(&self) -> QuestionKind {
        match self {
            Question::MultipleChoice(_) => QuestionKind::MultipleChoice,
            Question::MultipleSelect(_) => QuestionKind::MultipleSelect,
            Question::ShortAnswer(_) => QuestionKind::ShortAnswer,
            Question::Multipart(_) => QuestionKind::Multipart,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Question::MultipleChoice(q) => &q.text,
            Question::MultipleSelect(q) => &q.text,
            Question::ShortAnswer(q) => &q.text,
            Question::Multipart(q) => &q.text,
        }
    }

    /// Scalar worth of the question: the sum of its parts for multipart.
    pub fn score(&self) -> i64 {
        match self {
            Question::MultipleChoice(q) => q.score,
            Question::MultipleSelect(q) => q.score,
            Question::ShortAnswer(q) => q.score,
            Question::Multipart(q) => q
                .parts
                .iter()
                .map(Part::score)
                .fold(0, i64::saturating_add),
        }
    }

    /// Copy with every expected answer stripped, safe to send to a student.
    pub fn redacted(&self) -> Question {
        match self {
            Question::MultipleChoice(q) => Question::MultipleChoice(ChoiceQuestion {
                answer: None,
                ..q.clone()
            }),
            Question::MultipleSelect(q) => Question::MultipleSelect(SelectQuestion {
                answer: None,
                ..q.clone()
            }),
            Question::ShortAnswer(q) => Question::ShortAnswer(TextQuestion {
                answer: None,
                ..q.clone()
            }),
            Question::Multipart(q) => Question::Multipart(MultipartQuestion {
                text: q.text.clone(),
                parts: q.parts.iter().map(Part::redacted).collect(),
            }),
        }
    }
}

impl Part {
    pub fn kind(&self) -> QuestionKind {
        match self {
            Part::MultipleChoice(_) => QuestionKind::MultipleChoice,
            Part::MultipleSelect(_) => QuestionKind::MultipleSelect,
            Part::ShortAnswer(_) => QuestionKind::ShortAnswer,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Part::MultipleChoice(q) => &q.text,
            Part::MultipleSelect(q) => &q.text,
            Part::ShortAnswer(q) => &q.text,
        }
    }

    pub fn score(&self) -> i64 {
        match self {
            Part::MultipleChoice(q) => q.score,
            Part::MultipleSelect(q) => q.score,
            Part::ShortAnswer(q) => q.score,
        }
    }

    pub fn redacted(&self) -> Part {
        match self {
            Part::MultipleChoice(q) => Part::MultipleChoice(ChoiceQuestion {
                answer: None,
                ..q.clone()
            }),
            Part::MultipleSelect(q) => Part::MultipleSelect(SelectQuestion {
                answer: None,
                ..q.clone()
            }),
            Part::ShortAnswer(q) => Part::ShortAnswer(TextQuestion {
                answer: None,
                ..q.clone()
            }),
        }
    }
}

/// Older documents stored a lone string as a multiple-select answer.
fn one_or_many<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => None,
        Some(OneOrMany::One(single)) => Some(vec![single]),
        Some(OneOrMany::Many(many)) => Some(many),
    })
}
