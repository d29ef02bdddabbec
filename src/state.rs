// src/state.rs

use std::{sync::Arc, time::Duration};

use axum::extract::FromRef;
use sqlx::SqlitePool;

use crate::{
    config::Config,
    engine::QuizEngine,
    store::{
        LeaderboardRepository, QuizRepository, SqliteStore, handoff::HandoffStore,
        sessions::SessionStore,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Config,
    pub quizzes: Arc<dyn QuizRepository>,
    pub leaderboard: Arc<dyn LeaderboardRepository>,
    pub engine: QuizEngine,
}

impl AppState {
    /// Wires the SQLite store and the in-memory session and handoff stores
    /// into one engine.
    pub fn new(pool: SqlitePool, config: Config) -> Self {
        let store = Arc::new(SqliteStore::new(pool.clone()));
        let quizzes: Arc<dyn QuizRepository> = store.clone();
        let leaderboard: Arc<dyn LeaderboardRepository> = store;

        let engine = QuizEngine::new(
            quizzes.clone(),
            leaderboard.clone(),
            SessionStore::new(Duration::from_secs(config.attempt_ttl_seconds)),
            HandoffStore::new(Duration::from_secs(config.handoff_ttl_seconds)),
        );

        Self {
            pool,
            config,
            quizzes,
            leaderboard,
            engine,
        }
    }
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for QuizEngine {
    fn from_ref(state: &AppState) -> Self {
        state.engine.clone()
    }
}

impl FromRef<AppState> for Arc<dyn QuizRepository> {
    fn from_ref(state: &AppState) -> Self {
        state.quizzes.clone()
    }
}

impl FromRef<AppState> for Arc<dyn LeaderboardRepository> {
    fn from_ref(state: &AppState) -> Self {
        state.leaderboard.clone()
    }
}
