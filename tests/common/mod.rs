// tests/common/mod.rs

#![allow(dead_code)]

use pinquiz::{
    config::Config,
    models::quiz::Quiz,
    routes,
    state::AppState,
    store::{self, QuizRepository, SqliteStore},
    utils::{hash::hash_password, jwt::ADMIN_ROLE},
};
use serde_json::{Value, json};
use sqlx::SqlitePool;

pub const ADMIN_USERNAME: &str = "quizmaster";
pub const ADMIN_PASSWORD: &str = "correct-horse";

pub struct TestApp {
    pub address: String,
    pub pool: SqlitePool,
    pub client: reqwest::Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Stores a quiz document directly, bypassing the admin API.
    pub async fn seed_quiz(&self, quiz: Value) -> Quiz {
        let quiz: Quiz = serde_json::from_value(quiz).expect("Invalid quiz fixture");
        SqliteStore::new(self.pool.clone())
            .save_quiz(&quiz)
            .await
            .expect("Failed to seed quiz");
        quiz
    }

    pub async fn seed_admin(&self) {
        sqlx::query("INSERT INTO users (username, password, role) VALUES (?, ?, ?)")
            .bind(ADMIN_USERNAME)
            .bind(hash_password(ADMIN_PASSWORD).unwrap())
            .bind(ADMIN_ROLE)
            .execute(&self.pool)
            .await
            .expect("Failed to seed admin");
    }

    pub async fn admin_token(&self) -> String {
        self.seed_admin().await;

        let body: Value = self
            .client
            .post(self.url("/api/admin/login"))
            .json(&json!({"username": ADMIN_USERNAME, "password": ADMIN_PASSWORD}))
            .send()
            .await
            .expect("Login failed")
            .json()
            .await
            .expect("Failed to parse login json");

        body["token"].as_str().expect("Token not found").to_string()
    }
}

/// Spawns the app on a random port against a fresh in-memory database.
pub async fn spawn_app() -> TestApp {
    let database_url = "sqlite::memory:".to_string();

    let pool = store::connect(&database_url)
        .await
        .expect("Failed to open in-memory SQLite");
    store::migrate(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url,
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        log_dir: "logs".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        admin_username: None,
        admin_password: None,
        attempt_ttl_seconds: 600,
        handoff_ttl_seconds: 600,
        allowed_origins: vec!["http://localhost:3000".to_string()],
        static_dir: "static".to_string(),
        env_warnings: Vec::new(),
    };

    let app = routes::create_router(AppState::new(pool.clone(), config));

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        pool,
        client: reqwest::Client::new(),
    }
}

/// A one-question multiple-choice quiz: options {x, y}, answer x, worth 5.
pub fn single_choice_quiz(reviewable: bool) -> Value {
    json!({
        "id": "quiz-1",
        "pin": "123456",
        "practice_pin": "654321",
        "name": "Letters",
        "timer_seconds": 0,
        "instructions": "<p>Pick carefully</p>",
        "is_reviewable": reviewable,
        "display_config": {
            "mode": "question_count",
            "parameters": {"multiple-choice": 1},
            "target_score": 0
        },
        "practice_mode_config": {
            "enabled": true,
            "allow_student_selection": true,
            "max_questions_limit": 2
        },
        "questions": [
            {"type": "multiple-choice", "text": "Pick x", "options": ["x", "y"], "answer": "x", "score": 5},
            {"type": "short-answer", "text": "Say hi", "answer": "hi", "score": 2}
        ]
    })
}
