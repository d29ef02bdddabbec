// src/store/mod.rs

//! Persistence collaborators of the quiz engine.
//!
//! The engine only talks to the [`QuizRepository`] and [`LeaderboardRepository`]
//! traits; [`SqliteStore`] implements both on one connection pool. Transient
//! per-student state and review handoffs stay in memory.

pub mod handoff;
pub mod leaderboard;
pub mod quizzes;
pub mod sessions;
pub mod upgrade;

use std::{str::FromStr, time::Duration};

use async_trait::async_trait;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

use crate::{
    error::AppError,
    models::{leaderboard::LeaderboardRow, quiz::Quiz},
};

/// Which of a quiz's two PINs was entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinKind {
    Primary,
    Practice,
}

#[derive(Debug, Clone)]
pub struct PinMatch {
    pub quiz: Quiz,
    pub kind: PinKind,
}

/// Key-value store of quiz documents. Every read applies the schema upgrade.
#[async_trait]
pub trait QuizRepository: Send + Sync {
    /// `None` when the quiz does not exist or its document cannot be parsed.
    async fn load_quiz(&self, id: &str) -> Result<Option<Quiz>, AppError>;

    /// Inserts or replaces the document. Fails with `Conflict` when either PIN
    /// is already used by another quiz.
    async fn save_quiz(&self, quiz: &Quiz) -> Result<(), AppError>;

    async fn list_quizzes(&self) -> Result<Vec<Quiz>, AppError>;

    /// Exact match against primary and practice PINs.
    async fn find_by_pin(&self, pin: &str) -> Result<Option<PinMatch>, AppError>;

    /// Whether any quiz other than `except_id` uses `pin` as either PIN.
    async fn pin_in_use(&self, pin: &str, except_id: Option<&str>) -> Result<bool, AppError>;

    /// Deletes the quiz together with its leaderboard. Returns `false` if absent.
    async fn delete_quiz(&self, id: &str) -> Result<bool, AppError>;
}

/// Append-only per-quiz score table.
#[async_trait]
pub trait LeaderboardRepository: Send + Sync {
    async fn append_row(&self, quiz_id: &str, username: &str, score: i64) -> Result<(), AppError>;

    /// Rows sorted by score descending; equal scores keep insertion order.
    async fn list_rows(&self, quiz_id: &str) -> Result<Vec<LeaderboardRow>, AppError>;
}

/// SQLite-backed implementation of both repositories.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Opens the SQLite pool. An in-memory database is pinned to a single
/// long-lived connection, otherwise every connection would see its own empty
/// database.
pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    let pool_options = if database_url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    };

    pool_options
        .acquire_timeout(Duration::from_secs(3))
        .connect_with(options)
        .await
}

/// Applies the embedded migrations.
pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    let pool = connect("sqlite::memory:").await.unwrap();
    migrate(&pool).await.unwrap();
    pool
}
