// src/store/leaderboard.rs

use async_trait::async_trait;
use chrono::Utc;

use crate::{
    error::AppError,
    models::leaderboard::LeaderboardRow,
    store::{LeaderboardRepository, SqliteStore},
};

#[async_trait]
impl LeaderboardRepository for SqliteStore {
    async fn append_row(&self, quiz_id: &str, username: &str, score: i64) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO leaderboard_rows (quiz_id, username, score, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(quiz_id)
        .bind(username)
        .bind(score)
        .bind(Utc::now())
        .execute(self.pool())
        .await
        .map_err(|e| {
            tracing::error!("Failed to append leaderboard row for quiz {}: {:?}", quiz_id, e);
            AppError::from(e)
        })?;

        Ok(())
    }

    async fn list_rows(&self, quiz_id: &str) -> Result<Vec<LeaderboardRow>, AppError> {
        let rows = sqlx::query_as::<_, LeaderboardRow>(
            r#"
            SELECT username, score, created_at
            FROM leaderboard_rows
            WHERE quiz_id = ?
            ORDER BY score DESC, id ASC
            "#,
        )
        .bind(quiz_id)
        .fetch_all(self.pool())
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch leaderboard for quiz {}: {:?}", quiz_id, e);
            AppError::from(e)
        })?;

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_pool;

    #[tokio::test]
    async fn test_rows_sorted_by_score_and_never_deduplicated() {
        let store = SqliteStore::new(test_pool().await);
        store.append_row("quiz", "ann", 3).await.unwrap();
        store.append_row("quiz", "bob", 7).await.unwrap();
        store.append_row("quiz", "ann", 3).await.unwrap();
        store.append_row("quiz", "cat", 0).await.unwrap();
        store.append_row("other", "dan", 100).await.unwrap();

        let rows = store.list_rows("quiz").await.unwrap();
        let summary: Vec<(&str, i64)> = rows
            .iter()
            .map(|row| (row.username.as_str(), row.score))
            .collect();

        assert_eq!(summary, vec![("bob", 7), ("ann", 3), ("ann", 3), ("cat", 0)]);
    }
}
