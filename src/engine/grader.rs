// src/engine/grader.rs

//! Scores submitted answers and builds the review record.
//!
//! Grading never fails. An answer of the wrong shape, a missing expected
//! answer or a short multipart array only costs the affected question or part.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::models::{
    question::{ChoiceQuestion, Part, Question, SelectQuestion, TextQuestion},
    review::{ReviewItem, ReviewRecord},
};

/// Seconds of slack past the timer before a submission counts as late.
pub const GRACE_PERIOD_SECONDS: i64 = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct Grade {
    pub score: i64,
    /// Sum of the presented questions' scores.
    pub max_score: i64,
    pub time_expired: bool,
    pub review: ReviewRecord,
}

/// Answers keyed by presentation index. Keys that are not indices are dropped.
pub fn index_answers(raw: &HashMap<String, Value>) -> HashMap<usize, Value> {
    raw.iter()
        .filter_map(|(key, value)| key.trim().parse::<usize>().ok().map(|i| (i, value.clone())))
        .collect()
}

/// Whether a submission `elapsed_seconds` after the start misses the timer.
pub fn is_late(time_limit_seconds: i64, elapsed_seconds: i64) -> bool {
    time_limit_seconds > 0 && elapsed_seconds > time_limit_seconds + GRACE_PERIOD_SECONDS
}

/// Grades `questions` (in presentation order) against `answers`.
///
/// A late submission scores 0 but still gets a full review.
pub fn grade(
    questions: &[Question],
    answers: &HashMap<usize, Value>,
    time_limit_seconds: i64,
    elapsed_seconds: i64,
) -> Grade {
    let positioned: Vec<(usize, &Question)> = questions.iter().enumerate().collect();
    grade_positioned(&positioned, answers, time_limit_seconds, elapsed_seconds)
}

/// Like [`grade`], but each question keeps the position it was presented at.
/// Answers are matched by that position, so a gap left by a question that no
/// longer exists does not shift the answers of the questions after it.
pub fn grade_positioned(
    questions: &[(usize, &Question)],
    answers: &HashMap<usize, Value>,
    time_limit_seconds: i64,
    elapsed_seconds: i64,
) -> Grade {
    let time_expired = is_late(time_limit_seconds, elapsed_seconds);

    let review: ReviewRecord = questions
        .iter()
        .map(|(position, question)| {
            let student_answer = answers.get(position).filter(|v| !v.is_null()).cloned();
            let awarded = student_answer
                .as_ref()
                .map(|answer| award(question, answer))
                .unwrap_or(0);
            ReviewItem {
                position: *position,
                question: (*question).clone(),
                student_answer,
                awarded,
            }
        })
        .collect();

    let earned = review
        .iter()
        .fold(0i64, |total, item| total.saturating_add(item.awarded));
    let max_score = questions
        .iter()
        .fold(0i64, |total, (_, question)| total.saturating_add(question.score()));

    Grade {
        score: if time_expired { 0 } else { earned },
        max_score,
        time_expired,
        review,
    }
}

/// Points for one question.
pub fn award(question: &Question, answer: &Value) -> i64 {
    match question {
        Question::MultipleChoice(q) => award_choice(q, answer),
        Question::MultipleSelect(q) => award_selection(q, answer),
        Question::ShortAnswer(q) => award_text(q, answer),
        Question::Multipart(q) => {
            let Some(slots) = answer.as_array() else {
                return 0;
            };
            q.parts
                .iter()
                .enumerate()
                .map(|(i, part)| match slots.get(i) {
                    Some(slot) if !slot.is_null() => award_part(part, slot),
                    _ => 0,
                })
                .fold(0i64, i64::saturating_add)
        }
    }
}

fn award_part(part: &Part, answer: &Value) -> i64 {
    match part {
        Part::MultipleChoice(q) => award_choice(q, answer),
        Part::MultipleSelect(q) => award_selection(q, answer),
        Part::ShortAnswer(q) => award_text(q, answer),
    }
}

fn award_choice(q: &ChoiceQuestion, answer: &Value) -> i64 {
    if text_matches(q.answer.as_deref(), answer) {
        q.score
    } else {
        0
    }
}

fn award_text(q: &TextQuestion, answer: &Value) -> i64 {
    if text_matches(q.answer.as_deref(), answer) {
        q.score
    } else {
        0
    }
}

fn award_selection(q: &SelectQuestion, answer: &Value) -> i64 {
    let Some(expected) = q.answer.as_ref() else {
        return 0;
    };
    let Some(given) = answer.as_array() else {
        return 0;
    };

    let mut chosen = HashSet::new();
    for item in given {
        match item.as_str() {
            Some(s) => {
                chosen.insert(s);
            }
            None => return 0,
        }
    }

    let expected: HashSet<&str> = expected.iter().map(String::as_str).collect();
    if chosen == expected { q.score } else { 0 }
}

/// Case-insensitive comparison after trimming. A question with no expected
/// answer cannot be matched.
fn text_matches(expected: Option<&str>, answer: &Value) -> bool {
    let (Some(expected), Some(given)) = (expected, as_text(answer)) else {
        return false;
    };
    normalize(&given) == normalize(expected)
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn questions() -> Vec<Question> {
        serde_json::from_value(json!([
            {"type": "multiple-choice", "text": "Pick x", "options": ["x", "y"], "answer": "x", "score": 5},
            {"type": "multiple-select", "text": "Pick a and b", "options": ["a", "b", "c"], "answer": ["a", "b"], "score": 3},
            {"type": "short-answer", "text": "Capital of France", "answer": "Paris", "score": 2},
            {"type": "multipart", "text": "Parts", "parts": [
                {"type": "short-answer", "text": "p1", "answer": "one", "score": 1},
                {"type": "multiple-select", "text": "p2", "options": ["m", "n"], "answer": ["n"], "score": 2},
                {"type": "multiple-choice", "text": "p3", "options": ["u", "v"], "answer": "v", "score": 4}
            ]}
        ]))
        .unwrap()
    }

    fn answers(value: Value) -> HashMap<usize, Value> {
        let raw: HashMap<String, Value> = serde_json::from_value(value).unwrap();
        index_answers(&raw)
    }

    #[test]
    fn test_all_correct() {
        let grade = grade(
            &questions(),
            &answers(json!({
                "0": "x",
                "1": ["b", "a"],
                "2": "  paris ",
                "3": ["ONE", ["n"], "v"]
            })),
            0,
            10_000,
        );

        assert_eq!(grade.score, 5 + 3 + 2 + 7);
        assert_eq!(grade.max_score, 17);
        assert!(!grade.time_expired);
    }

    #[test]
    fn test_multi_select_is_exact_set_equality() {
        let qs = questions();
        assert_eq!(award(&qs[1], &json!(["b", "a"])), 3);
        assert_eq!(award(&qs[1], &json!(["a", "b", "a"])), 3);
        assert_eq!(award(&qs[1], &json!(["a"])), 0);
        assert_eq!(award(&qs[1], &json!(["a", "b", "c"])), 0);
        assert_eq!(award(&qs[1], &json!("a")), 0);
    }

    #[test]
    fn test_multipart_tolerates_short_and_null_slots() {
        let qs = questions();
        assert_eq!(award(&qs[3], &json!(["one"])), 1);
        assert_eq!(award(&qs[3], &json!([null, ["n"]])), 2);
        assert_eq!(award(&qs[3], &json!([])), 0);
        assert_eq!(award(&qs[3], &json!("one")), 0);
        assert_eq!(award(&qs[3], &json!([{"odd": true}, 7, "v"])), 4);
    }

    #[test]
    fn test_unanswered_questions_still_reviewed() {
        let grade = grade(&questions(), &answers(json!({"2": "Paris", "junk": 1})), 60, 1);

        assert_eq!(grade.score, 2);
        assert_eq!(grade.review.len(), 4);
        assert_eq!(grade.review[0].student_answer, None);
        assert_eq!(grade.review[2].student_answer, Some(json!("Paris")));
        assert_eq!(grade.review[2].awarded, 2);
    }

    #[test]
    fn test_time_expiry_forces_zero_but_keeps_review() {
        let qs = questions();
        let all_right = answers(json!({"0": "x", "1": ["a", "b"], "2": "paris", "3": ["one", ["n"], "v"]}));

        let late = grade(&qs, &all_right, 60, 66);
        assert!(late.time_expired);
        assert_eq!(late.score, 0);
        assert_eq!(late.review.iter().map(|r| r.awarded).sum::<i64>(), 17);

        let on_time = grade(&qs, &all_right, 60, 64);
        assert!(!on_time.time_expired);
        assert_eq!(on_time.score, 17);

        let untimed = grade(&qs, &all_right, 0, 99_999);
        assert_eq!(untimed.score, 17);
    }

    #[test]
    fn test_grading_is_deterministic() {
        let qs = questions();
        let given = answers(json!({"0": "y", "1": ["a"], "3": ["one"]}));

        assert_eq!(grade(&qs, &given, 30, 10), grade(&qs, &given, 30, 10));
    }

    #[test]
    fn test_missing_expected_answer_is_ungradable() {
        let q: Question = serde_json::from_value(json!({
            "type": "multiple-select", "text": "draft", "options": ["a"], "score": 2
        }))
        .unwrap();

        assert_eq!(award(&q, &json!(["a"])), 0);
        assert_eq!(award(&q, &json!([])), 0);
    }

    #[test]
    fn test_gap_in_positions_keeps_answers_aligned() {
        let qs = questions();
        // Position 1 was presented but its question no longer exists.
        let positioned = vec![(0, &qs[0]), (2, &qs[2])];
        let given = answers(json!({"0": "x", "1": ["a", "b"], "2": "Paris"}));

        let grade = grade_positioned(&positioned, &given, 0, 0);

        assert_eq!(grade.score, 7);
        assert_eq!(grade.max_score, 7);
        assert_eq!(grade.review[1].position, 2);
        assert_eq!(grade.review[1].student_answer, Some(json!("Paris")));
        assert_eq!(grade.review[1].awarded, 2);
    }

    #[test]
    fn test_huge_scores_saturate() {
        let q: Question = serde_json::from_value(json!({
            "type": "short-answer", "text": "big", "answer": "a", "score": i64::MAX
        }))
        .unwrap();
        let qs = vec![q.clone(), q];

        let grade = grade(&qs, &answers(json!({"0": "a", "1": "a"})), 0, 0);

        assert_eq!(grade.score, i64::MAX);
        assert_eq!(grade.max_score, i64::MAX);
    }

    #[test]
    fn test_numeric_answers_compare_as_text() {
        let q: Question = serde_json::from_value(json!({
            "type": "short-answer", "text": "2+2", "answer": "4", "score": 1
        }))
        .unwrap();

        assert_eq!(award(&q, &json!(4)), 1);
        assert_eq!(award(&q, &json!({"value": 4})), 0);
    }
}
