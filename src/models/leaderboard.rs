// src/models/leaderboard.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'leaderboard_rows' table in the database.
/// One row per completed attempt; never updated or deduplicated.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct LeaderboardRow {
    pub username: String,
    pub score: i64,
    #[sqlx(rename = "created_at")]
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// DTO for the public leaderboard page.
#[derive(Debug, Serialize)]
pub struct LeaderboardResponse {
    pub quiz_id: String,
    pub quiz_name: String,
    pub is_reviewable: bool,
    /// Name the caller submitted under, when the request carries their session.
    pub student_name: Option<String>,
    pub review_available: bool,
    pub rows: Vec<LeaderboardRow>,
}
