// src/store/quizzes.rs

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;

use crate::{
    error::AppError,
    models::quiz::Quiz,
    store::{PinKind, PinMatch, QuizRepository, SqliteStore, upgrade::upgrade_quiz_document},
};

/// Helper struct for fetching raw quiz documents.
#[derive(sqlx::FromRow)]
struct QuizDocumentRow {
    id: String,
    document: String,
}

/// Parses a stored document, upgrading it first. Corrupt documents are
/// logged and reported as absent.
fn parse_document(row: &QuizDocumentRow) -> Option<Quiz> {
    let mut doc: Value = match serde_json::from_str(&row.document) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::error!("Could not parse quiz {}. It may be corrupted: {}", row.id, e);
            return None;
        }
    };

    upgrade_quiz_document(&mut doc);

    match serde_json::from_value::<Quiz>(doc) {
        Ok(quiz) => Some(quiz),
        Err(e) => {
            tracing::error!("Quiz {} does not match the quiz schema: {}", row.id, e);
            None
        }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}

#[async_trait]
impl QuizRepository for SqliteStore {
    async fn load_quiz(&self, id: &str) -> Result<Option<Quiz>, AppError> {
        let row = sqlx::query_as::<_, QuizDocumentRow>(
            "SELECT id, document FROM quizzes WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| {
            tracing::error!("Failed to load quiz {}: {:?}", id, e);
            AppError::from(e)
        })?;

        Ok(row.as_ref().and_then(parse_document))
    }

    async fn save_quiz(&self, quiz: &Quiz) -> Result<(), AppError> {
        if quiz.pin == quiz.practice_pin {
            return Err(AppError::BadRequest(
                "Practice PIN must differ from the quiz PIN".to_string(),
            ));
        }

        let document = serde_json::to_string(quiz)
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;

        // Check-then-set inside one transaction so a concurrent save cannot
        // slip a duplicate PIN in between.
        let mut tx = self.pool().begin().await?;

        let clash = sqlx::query_scalar::<_, String>(
            r#"
            SELECT id FROM quizzes
            WHERE id <> ?
              AND (pin IN (?, ?) OR practice_pin IN (?, ?))
            LIMIT 1
            "#,
        )
        .bind(&quiz.id)
        .bind(&quiz.pin)
        .bind(&quiz.practice_pin)
        .bind(&quiz.pin)
        .bind(&quiz.practice_pin)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(other) = clash {
            tracing::warn!("PIN collision between quiz {} and quiz {}", quiz.id, other);
            return Err(AppError::Conflict(
                "PIN is already used by another quiz".to_string(),
            ));
        }

        sqlx::query(
            r#"
            INSERT INTO quizzes (id, pin, practice_pin, document, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                pin = excluded.pin,
                practice_pin = excluded.practice_pin,
                document = excluded.document,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&quiz.id)
        .bind(&quiz.pin)
        .bind(&quiz.practice_pin)
        .bind(&document)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("PIN is already used by another quiz".to_string())
            } else {
                tracing::error!("Failed to save quiz {}: {:?}", quiz.id, e);
                AppError::from(e)
            }
        })?;

        tx.commit().await?;

        Ok(())
    }

    async fn list_quizzes(&self) -> Result<Vec<Quiz>, AppError> {
        let rows = sqlx::query_as::<_, QuizDocumentRow>(
            "SELECT id, document FROM quizzes ORDER BY updated_at DESC, id",
        )
        .fetch_all(self.pool())
        .await
        .map_err(|e| {
            tracing::error!("Failed to list quizzes: {:?}", e);
            AppError::from(e)
        })?;

        Ok(rows.iter().filter_map(parse_document).collect())
    }

    async fn find_by_pin(&self, pin: &str) -> Result<Option<PinMatch>, AppError> {
        let row = sqlx::query_as::<_, QuizDocumentRow>(
            "SELECT id, document FROM quizzes WHERE pin = ? OR practice_pin = ? LIMIT 1",
        )
        .bind(pin)
        .bind(pin)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.as_ref().and_then(parse_document).map(|quiz| {
            let kind = if quiz.pin == pin {
                PinKind::Primary
            } else {
                PinKind::Practice
            };
            PinMatch { quiz, kind }
        }))
    }

    async fn pin_in_use(&self, pin: &str, except_id: Option<&str>) -> Result<bool, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM quizzes WHERE (pin = ? OR practice_pin = ?) AND id <> ?",
        )
        .bind(pin)
        .bind(pin)
        .bind(except_id.unwrap_or(""))
        .fetch_one(self.pool())
        .await?;

        Ok(count > 0)
    }

    async fn delete_quiz(&self, id: &str) -> Result<bool, AppError> {
        let mut tx = self.pool().begin().await?;

        sqlx::query("DELETE FROM leaderboard_rows WHERE quiz_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM quizzes WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete quiz {}: {:?}", id, e);
                AppError::from(e)
            })?;

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }
}
