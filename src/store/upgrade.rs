// src/store/upgrade.rs

//! Read-path upgrade of stored quiz documents.
//!
//! Older documents predate several fields. Every document read from storage
//! goes through [`upgrade_quiz_document`] before it is deserialized; the result
//! is never written back unless the quiz is later saved explicitly.

use serde_json::{Map, Value, json};

use crate::{
    models::quiz::{DisplayConfig, PracticeModeConfig},
    utils::pin::generate_pin,
};

/// Timer given to documents that never recorded one.
pub const LEGACY_TIMER_SECONDS: i64 = 600;

/// Fills in every field a current `Quiz` requires. Returns `true` when the
/// document was changed. Applying it to an upgraded document is a no-op.
pub fn upgrade_quiz_document(doc: &mut Value) -> bool {
    let Some(obj) = doc.as_object_mut() else {
        return false;
    };

    let mut changed = false;

    if !obj.contains_key("timer_seconds") {
        let timer = obj
            .remove("timer")
            .filter(Value::is_i64)
            .unwrap_or_else(|| json!(LEGACY_TIMER_SECONDS));
        obj.insert("timer_seconds".to_string(), timer);
        changed = true;
    }

    changed |= insert_missing(obj, "display_config", || {
        serde_json::to_value(DisplayConfig::default()).unwrap_or(Value::Null)
    });
    changed |= insert_missing(obj, "practice_mode_config", || {
        serde_json::to_value(PracticeModeConfig::default()).unwrap_or(Value::Null)
    });
    changed |= insert_missing(obj, "practice_pin", || Value::String(generate_pin()));
    changed |= insert_missing(obj, "is_reviewable", || Value::Bool(false));
    changed |= insert_missing(obj, "instructions", || Value::String(String::new()));
    changed |= insert_missing(obj, "questions", || Value::Array(Vec::new()));

    if changed {
        let id = obj.get("id").and_then(|v| v.as_str()).unwrap_or("<unknown>");
        tracing::info!("Upgrading old quiz format for quiz ID {}", id);
    }

    changed
}

/// Missing and explicit `null` are treated alike.
fn insert_missing(obj: &mut Map<String, Value>, key: &str, default: impl FnOnce() -> Value) -> bool {
    match obj.get(key) {
        Some(value) if !value.is_null() => false,
        _ => {
            obj.insert(key.to_string(), default());
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::quiz::{DisplayMode, Quiz};

    fn legacy_document() -> Value {
        json!({
            "id": "legacy",
            "pin": "111111",
            "name": "Old quiz",
            "timer": 300,
            "questions": [
                {"type": "short-answer", "text": "2+2?", "answer": "4", "score": 1}
            ]
        })
    }

    #[test]
    fn test_legacy_document_becomes_a_quiz() {
        let mut doc = legacy_document();
        assert!(upgrade_quiz_document(&mut doc));

        let quiz: Quiz = serde_json::from_value(doc).unwrap();
        assert_eq!(quiz.timer_seconds, 300);
        assert_eq!(quiz.display_config.mode, DisplayMode::QuestionCount);
        assert_eq!(quiz.display_config.target_score, 10);
        assert!(quiz.display_config.parameters.values().all(|c| *c == 0));
        assert!(!quiz.practice_mode_config.enabled);
        assert_eq!(quiz.practice_mode_config.max_questions_limit, 10);
        assert_eq!(quiz.practice_pin.len(), 6);
        assert!(!quiz.is_reviewable);
        assert_eq!(quiz.instructions, "");
    }

    #[test]
    fn test_upgrade_is_idempotent() {
        let mut once = legacy_document();
        upgrade_quiz_document(&mut once);

        let mut twice = once.clone();
        assert!(!upgrade_quiz_document(&mut twice));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_existing_fields_are_kept() {
        let mut doc = json!({
            "id": "current",
            "pin": "222222",
            "practice_pin": "333333",
            "name": "New quiz",
            "timer_seconds": 0,
            "instructions": "Read carefully",
            "is_reviewable": true,
            "display_config": {"mode": "total_score", "parameters": {}, "target_score": 7},
            "practice_mode_config": {"enabled": true, "allow_student_selection": true, "max_questions_limit": 3},
            "questions": []
        });
        let before = doc.clone();

        assert!(!upgrade_quiz_document(&mut doc));
        assert_eq!(doc, before);
    }

    #[test]
    fn test_missing_timer_gets_legacy_default() {
        let mut doc = json!({"id": "x", "pin": "1", "name": "n", "questions": []});
        upgrade_quiz_document(&mut doc);
        assert_eq!(doc["timer_seconds"], json!(LEGACY_TIMER_SECONDS));
    }
}
